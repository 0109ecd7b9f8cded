//! Process-wide defaults for the interpreter, read from environment variables.
use std::{str::FromStr, sync::LazyLock};

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Default for [`crate::vm::VMOptions`] `max_stack_size`.
    pub max_stack_size: usize,
    /// Default for [`crate::vm::VMOptions`] `max_op_count`.
    pub max_op_count: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config { max_stack_size: usize::MAX, max_op_count: u64::MAX }
    }
}

fn parse_env_opt<T>(key: &str) -> Option<T>
where
    T: FromStr, <T as FromStr>::Err: std::fmt::Display
{
    let val = std::env::var(key).ok()?;
    if val.is_empty() {
        return None;
    }
    match val.parse::<T>() {
        Ok(v) => Some(v),
        Err(err) => {
            tracing::warn!("Ignoring env var {key} with value {val}: {err}");
            None
        }
    }
}

fn parse_env<T>(key: &str, default: T) -> T
where
    T: FromStr, <T as FromStr>::Err: std::fmt::Display
{
    parse_env_opt(key).unwrap_or(default)
}

fn create_config() -> Config {
    let defaults = Config::default();
    Config {
        max_stack_size: parse_env("WHITESPACE_MAX_STACK_SIZE", defaults.max_stack_size),
        max_op_count: parse_env("WHITESPACE_MAX_OP_COUNT", defaults.max_op_count),
    }
}

static CELL: LazyLock<Config> = LazyLock::new(create_config);

pub fn get_config() -> &'static Config {
    &CELL
}
