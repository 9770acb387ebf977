use anyhow::{bail, Context, Result};
use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::parse_usize_from_bytes;
use crate::patrol::{self, Grid};

fn number(s: &str) -> Result<usize> {
    parse_usize_from_bytes(s.trim().as_bytes()).with_context(|| format!("invalid number {s:?}"))
}

pub fn day1(input: &str) -> Result<(usize, usize)> {
    let mut left = Vec::new();
    let mut right = Vec::new();
    for line in input.lines().filter(|line| !line.trim().is_empty()) {
        let mut numbers = line.split_ascii_whitespace().map(number);
        match (numbers.next(), numbers.next(), numbers.next()) {
            (Some(l), Some(r), None) => {
                left.push(l?);
                right.push(r?);
            }
            _ => bail!("expected two numbers per line, got {line:?}"),
        }
    }
    left.sort_unstable();
    right.sort_unstable();

    let distance = left.iter().zip(&right).map(|(l, r)| l.abs_diff(*r)).sum();

    let mut occurrences = FxHashMap::<usize, usize>::default();
    for &r in &right {
        *occurrences.entry(r).or_insert(0) += 1;
    }
    let similarity = left
        .iter()
        .map(|l| l * occurrences.get(l).copied().unwrap_or(0))
        .sum();

    Ok((distance, similarity))
}

fn is_safe(levels: &[usize]) -> bool {
    let increasing = levels.windows(2).next().map_or(true, |w| w[0] < w[1]);
    levels
        .windows(2)
        .all(|w| (w[0] < w[1]) == increasing && (1..=3).contains(&w[0].abs_diff(w[1])))
}

pub fn day2(input: &str) -> Result<(usize, usize)> {
    let mut safe = 0;
    let mut dampened = 0;
    let mut without = Vec::new();
    for line in input.lines().filter(|line| !line.trim().is_empty()) {
        let levels = line
            .split_ascii_whitespace()
            .map(number)
            .collect::<Result<Vec<_>>>()?;
        if is_safe(&levels) {
            safe += 1;
            dampened += 1;
            continue;
        }
        // Problem dampener: tolerate a single bad level.
        let tolerable = (0..levels.len()).any(|skip| {
            without.clear();
            without.extend_from_slice(&levels[..skip]);
            without.extend_from_slice(&levels[skip + 1..]);
            is_safe(&without)
        });
        if tolerable {
            dampened += 1;
        }
    }
    Ok((safe, dampened))
}

pub fn day3(input: &str) -> Result<(usize, usize)> {
    let re = Regex::new(r"mul\(([0-9]{1,3}),([0-9]{1,3})\)|do\(\)|don't\(\)")?;

    let mut sum_part1 = 0;
    let mut sum_part2 = 0;
    let mut enabled = true;
    for caps in re.captures_iter(input) {
        match &caps[0] {
            "do()" => enabled = true,
            "don't()" => enabled = false,
            _ => {
                let product = number(&caps[1])? * number(&caps[2])?;
                sum_part1 += product;
                if enabled {
                    sum_part2 += product;
                }
            }
        }
    }

    Ok((sum_part1, sum_part2))
}

pub fn day4(input: &str) -> Result<(usize, usize)> {
    const DIRECTIONS: [(isize, isize); 8] = [
        (-1, -1),
        (-1, 0),
        (-1, 1),
        (0, -1),
        (0, 1),
        (1, -1),
        (1, 0),
        (1, 1),
    ];

    let grid: Vec<&[u8]> = input
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::as_bytes)
        .collect();
    let at = |row: usize, col: usize, (drow, dcol): (isize, isize), dist: isize| {
        let row = row.checked_add_signed(drow * dist)?;
        let col = col.checked_add_signed(dcol * dist)?;
        grid.get(row)?.get(col).copied()
    };

    let mut xmas = 0;
    let mut x_mas = 0;
    for (row, line) in grid.iter().enumerate() {
        for (col, &b) in line.iter().enumerate() {
            match b {
                b'X' => {
                    xmas += DIRECTIONS
                        .iter()
                        .filter(|&&dir| {
                            b"MAS"
                                .iter()
                                .zip(1..)
                                .all(|(&c, dist)| at(row, col, dir, dist) == Some(c))
                        })
                        .count();
                }
                b'A' => {
                    let is_mas = |dir: (isize, isize)| {
                        matches!(
                            (at(row, col, dir, 1), at(row, col, dir, -1)),
                            (Some(b'M'), Some(b'S')) | (Some(b'S'), Some(b'M'))
                        )
                    };
                    if is_mas((-1, -1)) && is_mas((-1, 1)) {
                        x_mas += 1;
                    }
                }
                _ => {}
            }
        }
    }

    Ok((xmas, x_mas))
}

pub fn day5(input: &str) -> Result<(usize, usize)> {
    let mut lines = input.lines();
    let rules = lines
        .by_ref()
        .take_while(|line| !line.trim().is_empty())
        .map(|line| {
            let (before, after) = line
                .split_once('|')
                .with_context(|| format!("invalid ordering rule {line:?}"))?;
            Ok((number(before)?, number(after)?))
        })
        .collect::<Result<FxHashSet<_>>>()?;

    let mut sum_part1 = 0;
    let mut sum_part2 = 0;
    for line in lines.filter(|line| !line.trim().is_empty()) {
        let mut pages = line.split(',').map(number).collect::<Result<Vec<_>>>()?;
        let ordered = pages.iter().enumerate().all(|(i, &page)| {
            pages[i + 1..]
                .iter()
                .all(|&later| !rules.contains(&(later, page)))
        });
        if ordered {
            sum_part1 += pages[pages.len() / 2];
        } else {
            pages.sort_by(|&a, &b| {
                if rules.contains(&(a, b)) {
                    std::cmp::Ordering::Less
                } else if rules.contains(&(b, a)) {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            });
            sum_part2 += pages[pages.len() / 2];
        }
    }
    debug!(rules = rules.len(), "checked page updates");

    Ok((sum_part1, sum_part2))
}

pub fn day6(input: &str) -> Result<(usize, usize)> {
    let grid: Grid = input.parse()?;
    let distinct = patrol::distinct_cells(&grid)?;
    let loops = patrol::loop_obstructions(&grid)?.len();
    Ok((distinct, loops))
}
