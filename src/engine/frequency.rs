use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Offsets are `code_point - 32`, so printable ASCII spans `0..=94`.
pub const FIRST_PRINTABLE: u32 = 32;
pub const MAX_OFFSET: usize = 94;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

static SHARED: LazyLock<FrequencyModel> = LazyLock::new(FrequencyModel::build);

/// Character class a table covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CharClass {
    Symbol,
    Lowercase,
    Uppercase,
}

impl CharClass {
    pub const ALL: [CharClass; 3] = [CharClass::Symbol, CharClass::Lowercase, CharClass::Uppercase];

    pub fn as_str(self) -> &'static str {
        match self {
            CharClass::Symbol => "symbol",
            CharClass::Lowercase => "lowercase",
            CharClass::Uppercase => "uppercase",
        }
    }
}

/// Relative frequency of each retained character within one class.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassTable {
    entries: Vec<(usize, f64)>,
}

impl ClassTable {
    fn from_chars(pairs: &[(char, f64)]) -> Self {
        Self {
            entries: pairs
                .iter()
                .map(|&(ch, freq)| (char_offset(ch), freq))
                .collect(),
        }
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    pub fn frequency(&self, offset: usize) -> Option<f64> {
        self.entries
            .iter()
            .find(|&&(o, _)| o == offset)
            .map(|&(_, f)| f)
    }

    /// Sum of retained frequencies. Close to, but not exactly, 1.0.
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|&(_, f)| f).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn max_offset(&self) -> Option<usize> {
        self.entries.iter().map(|&(o, _)| o).max()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassWeights {
    pub symbol: f64,
    pub lowercase: f64,
    pub uppercase: f64,
}

impl ClassWeights {
    pub fn sum(&self) -> f64 {
        self.symbol + self.lowercase + self.uppercase
    }

    pub fn get(&self, class: CharClass) -> f64 {
        match class {
            CharClass::Symbol => self.symbol,
            CharClass::Lowercase => self.lowercase,
            CharClass::Uppercase => self.uppercase,
        }
    }
}

impl Default for ClassWeights {
    fn default() -> Self {
        Self {
            symbol: 0.2128,
            lowercase: 0.7626,
            uppercase: 0.0246,
        }
    }
}

/// Aggregate character statistics for typical English prose. Never mutated
/// after construction, so one instance can be shared freely.
#[derive(Clone, Debug, PartialEq)]
pub struct FrequencyModel {
    symbol: ClassTable,
    lowercase: ClassTable,
    uppercase: ClassTable,
    weights: ClassWeights,
}

impl FrequencyModel {
    /// Built-in tables. Entries below 0.0001 are omitted.
    pub fn build() -> Self {
        let symbol: &[(char, f64)] = &[
            (' ', 0.8075), (',', 0.0683), ('.', 0.0427), ('"', 0.0220), ('-', 0.0158),
            ('\'', 0.0152), (';', 0.0070), ('?', 0.0037), ('!', 0.0033), ('_', 0.0028),
            (':', 0.0017), ('1', 0.0014), (')', 0.0009), ('(', 0.0009), ('2', 0.0008),
            ('0', 0.0008), ('[', 0.0006), (']', 0.0006), ('3', 0.0006), ('8', 0.0006),
            ('5', 0.0005), ('4', 0.0005), ('7', 0.0004), ('6', 0.0004), ('9', 0.0003),
            ('*', 0.0003), ('|', 0.0001),
        ];

        let lowercase: &[(char, f64)] = &[
            ('e', 0.1277), ('t', 0.0916), ('a', 0.0808), ('o', 0.0779), ('n', 0.0700),
            ('i', 0.0650), ('h', 0.0645), ('s', 0.0631), ('r', 0.0595), ('d', 0.0440),
            ('l', 0.0411), ('u', 0.0291), ('m', 0.0244), ('c', 0.0239), ('f', 0.0230),
            ('w', 0.0228), ('y', 0.0199), ('g', 0.0198), ('p', 0.0163), ('b', 0.0144),
            ('v', 0.0100), ('k', 0.0077), ('x', 0.0015), ('q', 0.0010), ('j', 0.0009),
            ('z', 0.0005),
        ];

        let uppercase: &[(char, f64)] = &[
            ('I', 0.1693), ('T', 0.1003), ('A', 0.0730), ('S', 0.0640), ('H', 0.0606),
            ('M', 0.0590), ('B', 0.0457), ('W', 0.0440), ('C', 0.0415), ('E', 0.0394),
            ('N', 0.0330), ('L', 0.0326), ('O', 0.0314), ('P', 0.0299), ('R', 0.0296),
            ('D', 0.0289), ('G', 0.0263), ('F', 0.0252), ('Y', 0.0199), ('J', 0.0151),
            ('V', 0.0088), ('K', 0.0082), ('U', 0.0078), ('X', 0.0031), ('Q', 0.0020),
            ('Z', 0.0011),
        ];

        Self {
            symbol: ClassTable::from_chars(symbol),
            lowercase: ClassTable::from_chars(lowercase),
            uppercase: ClassTable::from_chars(uppercase),
            weights: ClassWeights::default(),
        }
    }

    /// Process-wide instance of [`FrequencyModel::build`], constructed on first use.
    pub fn shared() -> &'static FrequencyModel {
        &SHARED
    }

    pub fn from_tables(
        symbol: BTreeMap<usize, f64>,
        lowercase: BTreeMap<usize, f64>,
        uppercase: BTreeMap<usize, f64>,
        weights: ClassWeights,
    ) -> Result<Self, ModelError> {
        for class in CharClass::ALL {
            let value = weights.get(class);
            if !value.is_finite() || value < 0.0 {
                return Err(ModelError::InvalidWeight {
                    class: class.as_str(),
                    value,
                });
            }
        }
        let sum = weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ModelError::WeightSum(sum));
        }

        Ok(Self {
            symbol: validated_table(CharClass::Symbol, symbol)?,
            lowercase: validated_table(CharClass::Lowercase, lowercase)?,
            uppercase: validated_table(CharClass::Uppercase, uppercase)?,
            weights,
        })
    }

    /// Load a custom model from TOML. Tables are keyed by the character itself:
    ///
    /// ```toml
    /// [weights]
    /// symbol = 0.2
    /// lowercase = 0.75
    /// uppercase = 0.05
    ///
    /// [symbol]
    /// " " = 0.8
    /// [lowercase]
    /// e = 0.13
    /// [uppercase]
    /// T = 0.1
    /// ```
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let content = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ModelError> {
        let file: ModelFile = toml::from_str(content)?;
        Self::from_tables(
            keyed_by_offset(CharClass::Symbol, file.symbol)?,
            keyed_by_offset(CharClass::Lowercase, file.lowercase)?,
            keyed_by_offset(CharClass::Uppercase, file.uppercase)?,
            file.weights,
        )
    }

    pub fn table(&self, class: CharClass) -> &ClassTable {
        match class {
            CharClass::Symbol => &self.symbol,
            CharClass::Lowercase => &self.lowercase,
            CharClass::Uppercase => &self.uppercase,
        }
    }

    pub fn weights(&self) -> ClassWeights {
        self.weights
    }

    /// Shortest width table the estimator can index without going out of bounds.
    pub fn required_width_len(&self) -> usize {
        CharClass::ALL
            .iter()
            .filter_map(|&class| self.table(class).max_offset())
            .max()
            .map_or(0, |max| max + 1)
    }
}

impl Default for FrequencyModel {
    fn default() -> Self {
        Self::build()
    }
}

#[derive(Deserialize)]
struct ModelFile {
    #[serde(default)]
    weights: ClassWeights,
    #[serde(default)]
    symbol: BTreeMap<String, f64>,
    #[serde(default)]
    lowercase: BTreeMap<String, f64>,
    #[serde(default)]
    uppercase: BTreeMap<String, f64>,
}

pub fn char_offset(ch: char) -> usize {
    (ch as u32).saturating_sub(FIRST_PRINTABLE) as usize
}

fn keyed_by_offset(
    class: CharClass,
    table: BTreeMap<String, f64>,
) -> Result<BTreeMap<usize, f64>, ModelError> {
    table
        .into_iter()
        .map(|(key, freq)| {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) if ch.is_ascii() && !ch.is_ascii_control() => {
                    Ok((char_offset(ch), freq))
                }
                _ => Err(ModelError::InvalidKey {
                    class: class.as_str(),
                    key,
                }),
            }
        })
        .collect()
}

fn validated_table(
    class: CharClass,
    table: BTreeMap<usize, f64>,
) -> Result<ClassTable, ModelError> {
    let mut entries = Vec::with_capacity(table.len());
    for (offset, value) in table {
        if offset > MAX_OFFSET {
            return Err(ModelError::OffsetOutOfRange {
                class: class.as_str(),
                offset,
            });
        }
        if !value.is_finite() || value < 0.0 {
            return Err(ModelError::InvalidFrequency {
                class: class.as_str(),
                offset,
                value,
            });
        }
        entries.push((offset, value));
    }
    Ok(ClassTable { entries })
}
