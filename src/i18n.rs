//! Defines the [`StringTable`], which maps a (language, key) pair to a
//! localized string.

use serde::Deserialize;
use std::collections::HashMap;

/// Localized strings for every configured language. Lookups that miss fall
/// back to the key itself, so a missing translation never breaks a build.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct StringTable {
    languages: HashMap<String, HashMap<String, String>>,
}

impl StringTable {
    pub fn new(languages: HashMap<String, HashMap<String, String>>) -> StringTable {
        StringTable { languages }
    }

    /// Returns the string for `key` in `language`, or `key` itself when the
    /// language or the key is unknown.
    pub fn get<'a>(&'a self, language: &str, key: &'a str) -> &'a str {
        self.find(language, key).unwrap_or(key)
    }

    /// Returns the string for `key` in `language` if there is one.
    pub fn find(&self, language: &str, key: &str) -> Option<&str> {
        self.languages
            .get(language)
            .and_then(|strings| strings.get(key))
            .map(String::as_str)
    }

    /// Like [`StringTable::get`], returning an owned string.
    pub fn lookup(&self, language: &str, key: &str) -> String {
        self.get(language, key).to_owned()
    }
}
