//! Diatonic pitch representation
//!
//! Neume notation only needs diatonic steps: every staff position is a line or
//! a space, and moving one position moves one letter name.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pitch letter name
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PitchName {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl PitchName {
    const ALL: [PitchName; 7] = [
        PitchName::C,
        PitchName::D,
        PitchName::E,
        PitchName::F,
        PitchName::G,
        PitchName::A,
        PitchName::B,
    ];

    /// Index within the octave (c = 0 .. b = 6)
    pub fn index(self) -> i32 {
        self as i32
    }

    pub fn from_index(index: i32) -> Self {
        Self::ALL[index.rem_euclid(7) as usize]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PitchName::C => "c",
            PitchName::D => "d",
            PitchName::E => "e",
            PitchName::F => "f",
            PitchName::G => "g",
            PitchName::A => "a",
            PitchName::B => "b",
        }
    }
}

impl FromStr for PitchName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c" => Ok(PitchName::C),
            "d" => Ok(PitchName::D),
            "e" => Ok(PitchName::E),
            "f" => Ok(PitchName::F),
            "g" => Ok(PitchName::G),
            "a" => Ok(PitchName::A),
            "b" => Ok(PitchName::B),
            other => Err(format!("unknown pitch name '{}'", other)),
        }
    }
}

impl fmt::Display for PitchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pitch name with octave (c4 = middle c)
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pitch {
    pub pname: PitchName,
    pub oct: i32,
}

impl Pitch {
    pub fn new(pname: PitchName, oct: i32) -> Self {
        Self { pname, oct }
    }

    /// Parse MEI `pname` / `oct` attribute values
    pub fn from_mei(pname: &str, oct: &str) -> Result<Self, String> {
        let pname = pname.parse::<PitchName>()?;
        let oct = oct
            .trim()
            .parse::<i32>()
            .map_err(|_| format!("invalid octave '{}'", oct))?;
        Ok(Self { pname, oct })
    }

    /// Absolute diatonic index: octave * 7 + letter index
    pub fn diatonic_index(&self) -> i32 {
        self.oct * 7 + self.pname.index()
    }

    pub fn from_diatonic_index(index: i32) -> Self {
        Self {
            pname: PitchName::from_index(index),
            oct: index.div_euclid(7),
        }
    }

    /// Move by `steps` diatonic steps (negative moves down)
    pub fn step(&self, steps: i32) -> Self {
        Self::from_diatonic_index(self.diatonic_index() + steps)
    }

    /// Number of diatonic steps from `self` up to `other`
    pub fn steps_to(&self, other: &Pitch) -> i32 {
        other.diatonic_index() - self.diatonic_index()
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pname, self.oct)
    }
}
