//! Sample data generation.
//!
//! The row store asks a [`DataGenerator`] for one record at a time, so a full
//! replacement of `n` rows always yields exactly `n` records no matter what
//! the generator does internally.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::person::Person;

/// A source of fresh records for full data replacement.
pub trait DataGenerator<R> {
    /// Produces one record.
    fn generate(&mut self) -> R;
}

impl<R, F> DataGenerator<R> for F
where
    F: FnMut() -> R,
{
    fn generate(&mut self) -> R {
        self()
    }
}

/// Produces `count` records from `generator`.
pub fn make_data<R>(count: usize, generator: &mut dyn DataGenerator<R>) -> Vec<R> {
    (0..count).map(|_| generator.generate()).collect()
}

const FIRST_NAMES: &[&str] = &[
    "Ann", "Bruno", "Carla", "Dmitri", "Elena", "Farid", "Greta", "Hiro", "Ines", "Jonas",
    "Kemal", "Lucia", "Marek", "Nadia", "Oskar", "Priya", "Quentin", "Rosa", "Sven", "Tamsin",
];

const LAST_NAMES: &[&str] = &[
    "Adler", "Brandt", "Castillo", "Dubois", "Eriksen", "Fischer", "Gallo", "Hartmann",
    "Ivanova", "Jansen", "Kowalski", "Lindqvist", "Moreau", "Novak", "Okafor", "Petrov",
];

const STATUSES: &[&str] = &["relationship", "complicated", "single"];

/// Random [`Person`] generator.
///
/// Ages fall in `0..40`, visits in `0..1000`, progress in `0..100`, and the
/// status is one of `relationship`, `complicated` or `single`.
pub struct PersonGenerator {
    rng: StdRng,
}

impl PersonGenerator {
    /// A generator seeded from `seed`, or from OS entropy when `None`.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    fn pick(&mut self, pool: &'static [&'static str]) -> &'static str {
        pool.choose(&mut self.rng).copied().unwrap_or_default()
    }
}

impl DataGenerator<Person> for PersonGenerator {
    fn generate(&mut self) -> Person {
        let first_name = self.pick(FIRST_NAMES);
        let last_name = self.pick(LAST_NAMES);
        let status = self.pick(STATUSES);
        Person::new(
            first_name,
            last_name,
            self.rng.gen_range(0..40),
            self.rng.gen_range(0..1000),
            status,
            self.rng.gen_range(0..100),
        )
    }
}
