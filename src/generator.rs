//! 可复现的合成图书数据

use std::collections::HashSet;

use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use crate::data::book::Book;

pub const DEFAULT_SEED: u64 = 42;

const TITLE_WORDS: &[&str] = &[
    "Silent", "River", "Iron", "Garden", "Northern", "Glass", "Winter", "Hidden", "Paper",
    "Empire", "Lantern", "Ocean", "Atlas", "Shadow", "Golden", "Harbor", "Distant", "Clock",
    "Orchard", "Stone", "Forest", "Signal", "Copper", "Bridge", "Archive", "Summer", "Machine",
    "Island", "Letters", "Compass",
];

const GIVEN_NAMES: &[&str] = &[
    "Wei", "Ana", "James", "Li", "Maria", "Kenji", "Olga", "Samir", "Emma", "Jun", "Lucia",
    "David", "Mei", "Pavel", "Aisha", "Tomas",
];

const FAMILY_NAMES: &[&str] = &[
    "Zhang", "Silva", "Smith", "Wang", "Garcia", "Tanaka", "Ivanova", "Haddad", "Brown", "Chen",
    "Rossi", "Miller", "Liu", "Novak", "Khan", "Dvorak",
];

const PUBLISHERS: &[&str] = &[
    "Harbor Press",
    "Northwind Books",
    "Lantern House",
    "Blue Atlas Publishing",
    "Copperfield & Sons",
    "Meridian Academic",
    "Red Pine Media",
    "Summit University Press",
];

/// ISBN 形如 `ddd-d-ddd-ddddd-d`
fn random_isbn(rng: &mut StdRng) -> String {
    format!(
        "{}-{}-{}-{}-{}",
        rng.gen_range(100..=999),
        rng.gen_range(1..=9),
        rng.gen_range(100..=999),
        rng.gen_range(10000..=99999),
        rng.gen_range(0..=9)
    )
}

fn random_title(rng: &mut StdRng) -> String {
    let words = rng.gen_range(2..=4);
    TITLE_WORDS
        .choose_multiple(rng, words)
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

fn pick<'a>(rng: &mut StdRng, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

/// 生成 `n` 本 ISBN 互不相同的图书，相同的 `seed` 总是得到相同的结果
///
/// `ordered` 为 true 时按 ISBN 升序返回
pub fn generate_books(n: usize, ordered: bool, seed: u64) -> Vec<Book> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut seen = HashSet::with_capacity(n);
    let mut books = Vec::with_capacity(n);

    while books.len() < n {
        let isbn = random_isbn(&mut rng);
        if !seen.insert(isbn.clone()) {
            continue;
        }
        let author = format!(
            "{} {}",
            pick(&mut rng, GIVEN_NAMES),
            pick(&mut rng, FAMILY_NAMES)
        );
        books.push(Book::new(
            random_title(&mut rng),
            author,
            isbn,
            pick(&mut rng, PUBLISHERS).to_string(),
            rng.gen_range(1990..=2024),
        ));
    }

    if ordered {
        books.sort();
    }
    tracing::debug!(n, ordered, seed, "generated books");
    books
}
