pub mod patrol;
pub mod solutions;

use std::path::Path;

use anyhow::{Context, Result};

use solutions::*;

pub type Solution = fn(&str) -> Result<(usize, usize)>;

pub const ALL_SOLUTIONS: [Solution; 6] = [day1, day2, day3, day4, day5, day6];

pub const DEFAULT_INPUT_DIR: &str = "inputs";

/// Returns `None` unless bytes is a non-empty run of ASCII digits that fits into a `usize`.
pub fn parse_usize_from_bytes(bytes: &[u8]) -> Option<usize> {
    if bytes.is_empty() {
        return None;
    }
    let mut ret: usize = 0;
    for b in bytes {
        if !b.is_ascii_digit() {
            return None;
        }
        ret = ret.checked_mul(10)?.checked_add((b - b'0') as usize)?;
    }
    Some(ret)
}

pub fn load_input(dir: &Path, day: usize) -> Result<String> {
    let path = dir.join(format!("{}.txt", day));
    std::fs::read_to_string(&path).with_context(|| format!("reading input {}", path.display()))
}

pub fn default_input(day: usize) -> Result<String> {
    load_input(Path::new(DEFAULT_INPUT_DIR), day)
}
