//! Cookie session settings read from the environment.
//!
//! | Variable                  | Meaning                                     |
//! |---------------------------|---------------------------------------------|
//! | `SESSION_KEY_FILE`        | signing key: 64 bytes in release, 32 debug  |
//! | `SESSION_COOKIE_SECURE`   | mark the cookie `Secure` (default on)       |
//! | `SESSION_ALLOW_EPHEMERAL` | debug only: generate a key when none found  |

use std::path::PathBuf;

use actix_web::cookie::{Key, SameSite};
use mockable::Env;
use tracing::warn;
use zeroize::Zeroize;

const SESSION_KEY_DEFAULT_PATH: &str = "/var/run/secrets/forum_session_key";
pub const SESSION_KEY_MIN_LEN: usize = 64;
/// Shortest key material [`Key::derive_from`] accepts.
pub const SESSION_KEY_DEBUG_MIN_LEN: usize = 32;
const KEY_FILE_ENV: &str = "SESSION_KEY_FILE";
const COOKIE_SECURE_ENV: &str = "SESSION_COOKIE_SECURE";
const ALLOW_EPHEMERAL_ENV: &str = "SESSION_ALLOW_EPHEMERAL";
const BOOL_EXPECTED: &str = "1|0|true|false|yes|no";

/// Whether configuration mistakes are tolerated.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Fall back to defaults with a warning.
    Debug,
    /// Reject missing keys and malformed toggles.
    Release,
}

impl BuildMode {
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }
}

/// Settings for the cookie session middleware.
pub struct SessionSettings {
    pub key: Key,
    pub cookie_secure: bool,
    /// Forms post back to the forum itself, so `Lax` is always enough.
    pub same_site: SameSite,
}

#[derive(thiserror::Error, Debug)]
pub enum SessionConfigError {
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    #[error("SESSION_ALLOW_EPHEMERAL must be 0 in release builds")]
    EphemeralNotAllowed,
}

impl SessionSettings {
    /// Read the session settings through `env`.
    pub fn from_env<E: Env>(env: &E, mode: BuildMode) -> Result<Self, SessionConfigError> {
        let cookie_secure = flag(env, mode, COOKIE_SECURE_ENV, true)?;
        let allow_ephemeral = flag(env, mode, ALLOW_EPHEMERAL_ENV, false)?;
        if allow_ephemeral && mode == BuildMode::Release {
            return Err(SessionConfigError::EphemeralNotAllowed);
        }
        let key = load_key(env, mode, allow_ephemeral)?;
        Ok(Self {
            key,
            cookie_secure,
            same_site: SameSite::Lax,
        })
    }
}

fn flag<E: Env>(
    env: &E,
    mode: BuildMode,
    name: &'static str,
    default: bool,
) -> Result<bool, SessionConfigError> {
    let Some(value) = env.string(name) else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ if mode == BuildMode::Debug => {
            warn!(variable = name, value = %value, default, "invalid session toggle; using default");
            Ok(default)
        }
        _ => Err(SessionConfigError::InvalidEnv {
            name,
            value,
            expected: BOOL_EXPECTED,
        }),
    }
}

fn load_key<E: Env>(
    env: &E,
    mode: BuildMode,
    allow_ephemeral: bool,
) -> Result<Key, SessionConfigError> {
    let path = PathBuf::from(
        env.string(KEY_FILE_ENV)
            .unwrap_or_else(|| SESSION_KEY_DEFAULT_PATH.to_owned()),
    );
    match std::fs::read(&path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            let min_len = match mode {
                BuildMode::Release => SESSION_KEY_MIN_LEN,
                BuildMode::Debug => SESSION_KEY_DEBUG_MIN_LEN,
            };
            if length < min_len {
                bytes.zeroize();
                return Err(SessionConfigError::KeyTooShort {
                    path,
                    length,
                    min_len,
                });
            }
            let key = Key::derive_from(&bytes);
            bytes.zeroize();
            Ok(key)
        }
        Err(_) if mode == BuildMode::Debug && allow_ephemeral => {
            warn!(path = %path.display(), "session key unreadable; sessions end on restart");
            Ok(Key::generate())
        }
        Err(source) => Err(SessionConfigError::KeyRead { path, source }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockable::MockEnv;
    use rstest::rstest;
    use std::collections::HashMap;
    use uuid::Uuid;

    struct TempKeyFile(PathBuf);

    impl TempKeyFile {
        fn new(len: usize) -> Self {
            let path = std::env::temp_dir().join(format!("forum-session-key-{}", Uuid::new_v4()));
            std::fs::write(&path, vec![b'k'; len]).expect("write key file");
            Self(path)
        }

        fn path(&self) -> String {
            self.0.to_string_lossy().into_owned()
        }
    }

    impl Drop for TempKeyFile {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    fn env(vars: &[(&str, String)]) -> MockEnv {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| ((*name).to_owned(), value.clone()))
            .collect();
        let mut env = MockEnv::new();
        env.expect_string()
            .times(0..)
            .returning(move |name| vars.get(name).cloned());
        env
    }

    #[rstest]
    fn release_reads_the_key_and_defaults_to_secure() {
        let key = TempKeyFile::new(SESSION_KEY_MIN_LEN);
        let settings = SessionSettings::from_env(&env(&[(KEY_FILE_ENV, key.path())]), BuildMode::Release)
            .expect("valid settings");
        assert!(settings.cookie_secure);
        assert_eq!(settings.same_site, SameSite::Lax);
    }

    #[rstest]
    #[case("0", false)]
    #[case("yes", true)]
    #[case("FALSE", false)]
    fn cookie_secure_toggle_is_parsed(#[case] raw: &str, #[case] expected: bool) {
        let key = TempKeyFile::new(SESSION_KEY_MIN_LEN);
        let settings = SessionSettings::from_env(
            &env(&[(KEY_FILE_ENV, key.path()), (COOKIE_SECURE_ENV, raw.to_owned())]),
            BuildMode::Release,
        )
        .expect("valid settings");
        assert_eq!(settings.cookie_secure, expected);
    }

    #[rstest]
    fn release_rejects_malformed_toggles() {
        let key = TempKeyFile::new(SESSION_KEY_MIN_LEN);
        let result = SessionSettings::from_env(
            &env(&[(KEY_FILE_ENV, key.path()), (COOKIE_SECURE_ENV, "maybe".to_owned())]),
            BuildMode::Release,
        );
        assert!(matches!(
            result,
            Err(SessionConfigError::InvalidEnv { name: COOKIE_SECURE_ENV, .. })
        ));
    }

    #[rstest]
    fn debug_tolerates_malformed_toggles() {
        let key = TempKeyFile::new(SESSION_KEY_DEBUG_MIN_LEN);
        let settings = SessionSettings::from_env(
            &env(&[(KEY_FILE_ENV, key.path()), (COOKIE_SECURE_ENV, "maybe".to_owned())]),
            BuildMode::Debug,
        )
        .expect("debug accepts shorter keys and bad toggles");
        assert!(settings.cookie_secure);
    }

    #[rstest]
    #[case(BuildMode::Debug, 8, SESSION_KEY_DEBUG_MIN_LEN)]
    #[case(BuildMode::Debug, 31, SESSION_KEY_DEBUG_MIN_LEN)]
    #[case(BuildMode::Release, 32, SESSION_KEY_MIN_LEN)]
    fn keys_below_the_mode_minimum_are_refused(
        #[case] mode: BuildMode,
        #[case] len: usize,
        #[case] expected_min: usize,
    ) {
        let key = TempKeyFile::new(len);
        let result = SessionSettings::from_env(&env(&[(KEY_FILE_ENV, key.path())]), mode);
        assert!(matches!(
            result,
            Err(SessionConfigError::KeyTooShort { length, min_len, .. })
                if length == len && min_len == expected_min
        ));
    }

    #[rstest]
    fn release_rejects_short_keys() {
        let key = TempKeyFile::new(16);
        let result = SessionSettings::from_env(&env(&[(KEY_FILE_ENV, key.path())]), BuildMode::Release);
        assert!(matches!(
            result,
            Err(SessionConfigError::KeyTooShort { length: 16, .. })
        ));
    }

    #[rstest]
    fn release_refuses_ephemeral_keys() {
        let result = SessionSettings::from_env(
            &env(&[(ALLOW_EPHEMERAL_ENV, "1".to_owned())]),
            BuildMode::Release,
        );
        assert!(matches!(result, Err(SessionConfigError::EphemeralNotAllowed)));
    }

    #[rstest]
    #[case(BuildMode::Debug, "0")]
    #[case(BuildMode::Release, "0")]
    fn missing_keys_fail_without_ephemeral(#[case] mode: BuildMode, #[case] ephemeral: &str) {
        let missing = std::env::temp_dir().join(format!("forum-missing-{}", Uuid::new_v4()));
        let result = SessionSettings::from_env(
            &env(&[
                (KEY_FILE_ENV, missing.to_string_lossy().into_owned()),
                (ALLOW_EPHEMERAL_ENV, ephemeral.to_owned()),
            ]),
            mode,
        );
        assert!(matches!(result, Err(SessionConfigError::KeyRead { .. })));
    }

    #[rstest]
    fn debug_generates_ephemeral_keys_when_allowed() {
        let missing = std::env::temp_dir().join(format!("forum-missing-{}", Uuid::new_v4()));
        let result = SessionSettings::from_env(
            &env(&[
                (KEY_FILE_ENV, missing.to_string_lossy().into_owned()),
                (ALLOW_EPHEMERAL_ENV, "1".to_owned()),
            ]),
            BuildMode::Debug,
        );
        assert!(result.is_ok());
    }
}
