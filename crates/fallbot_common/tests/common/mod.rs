//! Shared fixtures for fallbot_common integration tests.

#![allow(dead_code)]

use std::cell::Cell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use fallbot_common::brain::{BrainRepository, BrainStorage, FsStorage};
use fallbot_common::dialog::DialogKey;
use fallbot_common::engine::{EngineError, MatchingEngine, PatternEngine};
use fallbot_common::identity::ConfiguredIdentity;
use fallbot_common::predicates::Predicate;
use fallbot_common::{FallbackOrchestrator, FallbotConfig, Speaker};
use tempfile::TempDir;

pub const CHAT_AIML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<aiml version="1.0.1">
  <category><pattern>HELLO</pattern><template>Hi there</template></category>
  <category><pattern>BEGIN CHAT</pattern><template>Sure, what shall we talk about?</template></category>
  <category><pattern>END CHAT</pattern><template>Okay, talk to you later.</template></category>
  <category><pattern>HOW ARE YOU</pattern><template>I am fine. And you?</template></category>
  <category><pattern>I AM *</pattern><template>Why are you <star/>?</template></category>
  <category><pattern>I LIKE *</pattern><template>I like <star/> too.</template></category>
  <category><pattern>WHAT IS YOUR NAME</pattern><template>My name is <bot name="name"/>.</template></category>
  <category><pattern>RANDOM PICK UP LINE</pattern><template>Do you come here often?</template></category>
</aiml>
"#;

pub const SMALLTALK_AIML: &str = r#"<aiml>
  <category><pattern>WHO ARE YOU</pattern><template><srai>WHAT IS YOUR NAME</srai></template></category>
  <category><pattern>TELL ME A JOKE</pattern><template>
    <random>
      <li>Why did the robot cross the road?</li>
      <li>I would tell you a UDP joke, but you might not get it.</li>
    </random>
  </template></category>
</aiml>
"#;

/// Speaker that remembers everything
#[derive(Debug, Default)]
pub struct RecordingSpeaker {
    pub spoken: Vec<(String, bool)>,
    pub dialogs: Vec<DialogKey>,
}

impl RecordingSpeaker {
    pub fn last(&self) -> Option<&(String, bool)> {
        self.spoken.last()
    }
}

impl Speaker for RecordingSpeaker {
    fn speak(&mut self, text: &str, expect_response: bool) {
        self.spoken.push((text.to_string(), expect_response));
    }

    fn speak_dialog(&mut self, key: DialogKey, _seed: u64) {
        self.dialogs.push(key);
    }
}

/// PatternEngine that logs queries and can refuse to clear
#[derive(Debug, Default)]
pub struct CountingEngine {
    pub inner: PatternEngine,
    pub queries: Vec<String>,
    pub fail_reset: bool,
}

impl MatchingEngine for CountingEngine {
    fn learn(&mut self, source: &Path) -> Result<(), EngineError> {
        self.inner.learn(source)
    }

    fn load_snapshot(&mut self, path: &Path) -> Result<(), EngineError> {
        self.inner.load_snapshot(path)
    }

    fn save_snapshot(&mut self, path: &Path) -> Result<(), EngineError> {
        self.inner.save_snapshot(path)
    }

    fn reset_state(&mut self) -> Result<(), EngineError> {
        if self.fail_reset {
            return Err(EngineError::Reset("engine refused".to_string()));
        }
        self.inner.reset_state()
    }

    fn set_predicate(&mut self, predicate: Predicate, value: &str) {
        self.inner.set_predicate(predicate, value)
    }

    fn respond(&mut self, utterance: &str) -> String {
        self.queries.push(utterance.to_string());
        self.inner.respond(utterance)
    }

    fn category_count(&self) -> usize {
        self.inner.category_count()
    }
}

/// Filesystem storage whose snapshot removal can be made to fail
#[derive(Debug, Clone, Default)]
pub struct FlakyStorage {
    pub fail_remove: Rc<Cell<bool>>,
    pub removals: Rc<Cell<u32>>,
}

impl BrainStorage for FlakyStorage {
    fn list_corpus(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        FsStorage.list_corpus(dir)
    }

    fn snapshot_exists(&self, path: &Path) -> bool {
        FsStorage.snapshot_exists(path)
    }

    fn remove_snapshot(&self, path: &Path) -> io::Result<()> {
        if self.fail_remove.get() {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only storage"));
        }
        self.removals.set(self.removals.get() + 1);
        FsStorage.remove_snapshot(path)
    }
}

pub type TestOrchestrator = FallbackOrchestrator<CountingEngine, RecordingSpeaker, FlakyStorage>;

pub struct Fixture {
    pub dir: TempDir,
    pub config: FallbotConfig,
    pub storage: FlakyStorage,
}

impl Fixture {
    pub fn new(files: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("aiml");
        fs::create_dir_all(&corpus).unwrap();
        for (name, content) in files {
            fs::write(corpus.join(name), content).unwrap();
        }

        let mut config = FallbotConfig::default();
        config.brain.corpus_dir = corpus;
        config.brain.snapshot_path = dir.path().join("brain").join("bot_brain.brn");
        config.identity.name = Some("Marvin".to_string());
        config.identity.device_type = Some("mark-1".to_string());

        Self {
            dir,
            config,
            storage: FlakyStorage::default(),
        }
    }

    pub fn standard() -> Self {
        Self::new(&[("chat.aiml", CHAT_AIML), ("smalltalk.aiml", SMALLTALK_AIML)])
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.config.brain.snapshot_path
    }

    pub fn corpus_dir(&self) -> &Path {
        &self.config.brain.corpus_dir
    }

    pub fn repository(&self) -> BrainRepository<CountingEngine, FlakyStorage> {
        BrainRepository::new(
            CountingEngine::default(),
            self.storage.clone(),
            &self.config.brain,
            Box::new(ConfiguredIdentity::new(&self.config.identity)),
            self.config.identity.clone(),
        )
    }

    pub fn orchestrator(&self) -> TestOrchestrator {
        FallbackOrchestrator::new(self.repository(), RecordingSpeaker::default(), &self.config)
            .expect("bootstrap")
    }
}

pub fn utterances(text: &str) -> Vec<String> {
    vec![text.to_string()]
}
