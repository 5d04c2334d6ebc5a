//! Exit codes for fallbotctl

use fallbot_common::FallbotError;

/// Exit code for success
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for general errors
pub const EXIT_GENERAL_ERROR: i32 = 1;

/// Exit code when the brain cannot be bootstrapped or reset
pub const EXIT_BRAIN_UNAVAILABLE: i32 = 70;

/// Map a failed command to its exit status
pub fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<FallbotError>() {
        Some(e) if e.is_fatal() => EXIT_BRAIN_UNAVAILABLE,
        _ => EXIT_GENERAL_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_errors_map_to_unavailable() {
        let err = anyhow::Error::new(FallbotError::Unavailable);
        assert_eq!(exit_code(&err), EXIT_BRAIN_UNAVAILABLE);

        let err = anyhow::Error::new(FallbotError::Config("bad".to_string()));
        assert_eq!(exit_code(&err), EXIT_GENERAL_ERROR);

        assert_eq!(exit_code(&anyhow::anyhow!("plain")), EXIT_GENERAL_ERROR);
    }
}
