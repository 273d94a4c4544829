//! Matching author names to email addresses.
//!
//! Some publishers list email addresses apart from the authors they belong
//! to, for example only in the PDF full text. Reconciliation assigns those
//! addresses by looking for normalized pieces of each author's name
//! ("segments") inside the addresses.
//!
//! Matching is greedy: authors are visited in order, and for each author the
//! unused emails are tried in sorted order against the author's segments,
//! longest segment first. The first hit assigns that email to the author and
//! marks it used; each author receives at most one email per call. Authors
//! without a match are left unchanged.

use regex::Regex;
use std::collections::BTreeSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::Author;

/// Transliterations tried in addition to the plain ASCII folding
const DIACRITIC_REPLACEMENTS: &[(char, &str)] = &[('ä', "ae"), ('ö', "oe"), ('ü', "ue"), ('ß', "ss")];

/// Characters joining the parts of compound names
const NAME_SPLITTERS: &[char] = &['-', '\''];

/// Ways the parts of a compound name are commonly joined in email addresses
const PART_JOINERS: &[&str] = &["-", "_", ""];

/// Segments this short tend to match domain endings
const MIN_SEGMENT_LEN: usize = 3;

const EMAIL_PATTERN: &str = r"[\w.-]+@[\w.-]+\.\w+";

/// Normalized name segments, longest first.
///
/// Ties in length are ordered alphabetically.
pub fn name_segments(name: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for token in name.to_lowercase().split_whitespace() {
        tokens.push(token.to_string());
        for (from, to) in DIACRITIC_REPLACEMENTS {
            if token.contains(*from) {
                tokens.push(token.replace(*from, to));
            }
        }
    }

    let mut segments = Vec::new();
    for token in &tokens {
        if !token.contains(NAME_SPLITTERS) {
            segments.push(token.clone());
            continue;
        }
        for splitter in NAME_SPLITTERS.iter().filter(|s| token.contains(**s)) {
            let parts: Vec<&str> = token.split(*splitter).collect();
            segments.extend(PART_JOINERS.iter().map(|joiner| parts.join(*joiner)));
            segments.extend(parts.iter().map(|part| part.to_string()));
        }
    }

    let unique: BTreeSet<String> = segments
        .iter()
        .map(|segment| ascii_fold(segment))
        .filter(|segment| segment.chars().count() >= MIN_SEGMENT_LEN)
        .collect();

    let mut segments: Vec<String> = unique.into_iter().collect();
    // BTreeSet order is alphabetical; the stable sort keeps it within equal lengths
    segments.sort_by_key(|segment| std::cmp::Reverse(segment.len()));
    segments
}

/// Transliterate to plain ASCII: strip accents, expand ligatures, drop the rest
pub fn ascii_fold(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());
    for c in text.nfd().filter(|c| !is_combining_mark(*c)) {
        if c.is_ascii() {
            folded.push(c);
            continue;
        }
        match c {
            'ß' => folded.push_str("ss"),
            'æ' => folded.push_str("ae"),
            'œ' => folded.push_str("oe"),
            'ø' => folded.push('o'),
            'ł' => folded.push('l'),
            'đ' | 'ð' => folded.push('d'),
            'þ' => folded.push_str("th"),
            'ı' => folded.push('i'),
            _ => {}
        }
    }
    folded
}

/// Assign emails to authors; returns how many emails were assigned.
///
/// `authors` are updated in place and only ever gain emails.
pub fn match_emails(emails: &BTreeSet<String>, authors: &mut [Author]) -> usize {
    let mut used: BTreeSet<&str> = BTreeSet::new();

    for author in authors.iter_mut() {
        let segments = name_segments(&author.name);
        if segments.is_empty() {
            continue;
        }

        let found = emails
            .iter()
            .filter(|email| !used.contains(email.as_str()))
            .find(|email| {
                let email = email.to_lowercase();
                segments.iter().any(|segment| email.contains(segment.as_str()))
            });

        if let Some(email) = found {
            tracing::debug!("Matched {} to {}", email, author.name);
            author.emails.insert(email.clone());
            used.insert(email.as_str());
        }
    }

    used.len()
}

/// Email addresses found anywhere in a text
pub fn find_emails(text: &str) -> BTreeSet<String> {
    match Regex::new(EMAIL_PATTERN) {
        Ok(re) => re.find_iter(text).map(|m| m.as_str().to_string()).collect(),
        Err(e) => {
            tracing::error!("Invalid email pattern: {}", e);
            BTreeSet::new()
        }
    }
}

/// First email address in a text
pub fn first_email(text: &str) -> Option<String> {
    Regex::new(EMAIL_PATTERN)
        .ok()?
        .find(text)
        .map(|m| m.as_str().to_string())
}
