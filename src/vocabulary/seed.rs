use include_dir::{include_dir, Dir};
use serde::Deserialize;
use serde_json::from_str;
use std::error::Error;
use std::io::Read;
use std::path::Path;

static WORDS_DIR: Dir = include_dir!("src/vocabulary/words");

/// A word as it appears in an import source, before the store assigns an id
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SeedWord {
    pub czech: String,
    pub english: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct WordList {
    pub name: String,
    pub size: u32,
    pub words: Vec<SeedWord>,
}

impl WordList {
    /// Load one of the word lists compiled into the binary
    pub fn bundled(name: &str) -> Result<Self, Box<dyn Error>> {
        let file = WORDS_DIR
            .get_file(format!("{name}.json"))
            .ok_or_else(|| format!("Word list not found: {name}"))?;

        let contents = file
            .contents_utf8()
            .ok_or("Unable to interpret word list as a string")?;

        Ok(from_str(contents)?)
    }

    /// The default Czech/English list
    pub fn czech() -> Result<Self, Box<dyn Error>> {
        Self::bundled("czech")
    }
}

/// Read `czech,english,category,level` rows; the last two columns may be empty
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<SeedWord>, csv::Error> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
        .deserialize()
        .collect()
}

pub fn read_csv_file<P: AsRef<Path>>(path: P) -> Result<Vec<SeedWord>, csv::Error> {
    let file = std::fs::File::open(path)?;
    read_csv(file)
}
