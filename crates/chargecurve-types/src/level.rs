// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of ChargeCurve.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of distinct battery levels (0..=100)
pub const LEVEL_COUNT: usize = 101;

/// Battery state of charge as an integer percentage (0-100)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Level(u8);

impl Level {
    pub const EMPTY: Level = Level(0);
    pub const FULL: Level = Level(100);

    /// Returns `None` when the value lies outside 0..=100
    pub fn new(value: i64) -> Option<Self> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= Self::FULL.0)
            .map(Self)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Position of this level in a 101-entry table
    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    /// All levels in ascending order, 0 through 100
    pub fn all() -> impl Iterator<Item = Level> {
        (Self::EMPTY.0..=Self::FULL.0).map(Self)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.0
    }
}

impl TryFrom<u8> for Level {
    type Error = LevelOutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(i64::from(value)).ok_or(LevelOutOfRange(i64::from(value)))
    }
}

/// A battery level outside 0..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelOutOfRange(pub i64);

impl fmt::Display for LevelOutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "battery level {} is outside 0..=100", self.0)
    }
}

impl std::error::Error for LevelOutOfRange {}
