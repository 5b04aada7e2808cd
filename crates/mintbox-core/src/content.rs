//! Random display titles and descriptions for regenerated drafts.

use rand::seq::IndexedRandom;
use rand::Rng;

pub const ADJECTIVES: &[&str] = &[
    "Cosmic",
    "Abstract",
    "Digital",
    "Ethereal",
    "Vibrant",
    "Mystical",
    "Geometric",
    "Surreal",
    "Harmonic",
    "Radiant",
];

pub const NOUNS: &[&str] = &[
    "Dream", "Harmony", "Vision", "Journey", "Canvas", "Spectrum", "Realm", "Echo", "Pulse",
    "Aura",
];

pub const DESCRIPTORS: &[&str] = &[
    "A unique digital artwork",
    "An algorithmic masterpiece",
    "A generative art piece",
    "A blockchain-ready creation",
    "An innovative NFT design",
];

pub const ORIGINS: &[&str] = &[
    "generated on GitHub Pages",
    "crafted with code",
    "born from algorithms",
    "inspired by the digital age",
];

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, words: &'a [&'a str]) -> &'a str {
    words.choose(rng).copied().unwrap_or_default()
}

/// `"{Adjective} {Noun} #{1..=1000}"`
pub fn random_title<R: Rng + ?Sized>(rng: &mut R) -> String {
    let adjective = pick(rng, ADJECTIVES);
    let noun = pick(rng, NOUNS);
    let number = rng.random_range(1..=1000);
    format!("{} {} #{}", adjective, noun, number)
}

/// `"{Descriptor} {origin}."`
pub fn random_description<R: Rng + ?Sized>(rng: &mut R) -> String {
    let descriptor = pick(rng, DESCRIPTORS);
    let origin = pick(rng, ORIGINS);
    format!("{} {}.", descriptor, origin)
}
