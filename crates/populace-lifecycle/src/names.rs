//! Deterministic name pools.
//!
//! Names are drawn with the attempt's random source, so a person's name is
//! a pure function of its attempt seed.

use rand::{Rng, RngCore};

// -----------------------------------------------------------------------
// Name pools
// -----------------------------------------------------------------------

/// Given names for people recorded as `F`.
const FEMALE_NAMES: &[&str] = &[
    "Abigail", "Beatriz", "Chloe", "Daniela", "Elena", "Fatima", "Grace", "Hannah",
    "Imani", "Jasmine", "Keiko", "Lucia", "Maya", "Nadia", "Olivia", "Priya",
    "Rosa", "Sofia", "Tanya", "Uma", "Valeria", "Wei", "Ximena", "Yara", "Zoe",
];

/// Given names for people recorded as `M` or with no recorded sex.
const MALE_NAMES: &[&str] = &[
    "Aaron", "Bruno", "Carlos", "Dmitri", "Elijah", "Felipe", "Gabriel", "Hiro",
    "Ibrahim", "Jamal", "Kwame", "Liam", "Mateo", "Nikhil", "Omar", "Pedro",
    "Quentin", "Rafael", "Samuel", "Tomas", "Umar", "Victor", "Wen", "Yusuf", "Zane",
];

/// Family names.
const SURNAMES: &[&str] = &[
    "Adams", "Baptiste", "Chen", "Dubois", "Estrada", "Fitzgerald", "Garcia", "Haddad",
    "Ito", "Johnson", "Kowalski", "Lopez", "Murphy", "Nguyen", "Okafor", "Patel",
    "Quinn", "Rossi", "Silva", "Tran", "Ueda", "Vargas", "Walsh", "Yamamoto", "Zhang",
];

/// Draw a full name. `gender` is the person's recorded sex code (`M`/`F`).
pub fn pick_name(rng: &mut dyn RngCore, gender: Option<&str>) -> String {
    let given = if gender == Some("F") {
        FEMALE_NAMES
    } else {
        MALE_NAMES
    };
    let first = pick(rng, given).unwrap_or("Alex");
    let last = pick(rng, SURNAMES).unwrap_or("Doe");
    format!("{first} {last}")
}

fn pick<'a>(rng: &mut dyn RngCore, pool: &[&'a str]) -> Option<&'a str> {
    if pool.is_empty() {
        return None;
    }
    let idx = rng.random_range(0..pool.len());
    pool.get(idx).copied()
}
