use super::dna::Dna;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A candidate strategy: one genome plus lineage and its latest score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organism {
    pub generation: u32,
    pub id: String,
    pub dna: Dna,
    /// Recomputed every generation, never carried forward
    pub fitness: f64,
    pub parents: Option<[String; 2]>,
}

impl Organism {
    pub fn new(generation: u32, id: impl Into<String>, dna: Dna) -> Self {
        Self {
            generation,
            id: id.into(),
            dna,
            fitness: 0.0,
            parents: None,
        }
    }

    pub fn create_random<R: Rng + ?Sized>(generation: u32, id: impl Into<String>, rng: &mut R) -> Self {
        Self::new(generation, id, Dna::random(rng))
    }

    pub fn mutate<R: Rng + ?Sized>(&mut self, rate: f64, rng: &mut R) {
        self.dna.mutate(rate, rng);
    }

    /// Uniform gene-wise crossover. The child is unscored and one generation younger.
    pub fn crossover<R: Rng + ?Sized>(
        &self,
        partner: &Organism,
        child_id: impl Into<String>,
        rng: &mut R,
    ) -> Organism {
        Organism {
            generation: self.generation + 1,
            id: child_id.into(),
            dna: self.dna.crossover(&partner.dna, rng),
            fitness: 0.0,
            parents: Some([self.id.clone(), partner.id.clone()]),
        }
    }

    pub fn is_offspring(&self) -> bool {
        self.parents.is_some()
    }
}

/// UUID v4 string drawn from the caller's RNG, so seeded runs produce stable ids
pub fn new_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    let bytes: [u8; 16] = rng.random();
    uuid::Builder::from_random_bytes(bytes)
        .into_uuid()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_create_random_is_unscored_root() {
        let mut rng = StdRng::seed_from_u64(1);
        let org = Organism::create_random(0, "seed-1", &mut rng);
        assert_eq!(org.generation, 0);
        assert_eq!(org.fitness, 0.0);
        assert!(org.parents.is_none());
        assert!(org.dna.ma_fast() < org.dna.ma_slow());
    }

    #[test]
    fn test_crossover_records_lineage() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut a = Organism::create_random(3, "a", &mut rng);
        let b = Organism::create_random(3, "b", &mut rng);
        a.fitness = 0.8;

        let child = a.crossover(&b, "c", &mut rng);
        assert_eq!(child.generation, 4);
        assert_eq!(child.fitness, 0.0);
        assert_eq!(child.parents, Some(["a".to_string(), "b".to_string()]));
        assert!(child.is_offspring());
    }

    #[test]
    fn test_ids_are_uuid_and_seed_stable() {
        let mut first = StdRng::seed_from_u64(42);
        let mut second = StdRng::seed_from_u64(42);
        let id = new_id(&mut first);
        assert!(uuid::Uuid::parse_str(&id).is_ok());
        assert_eq!(id, new_id(&mut second));
        assert_ne!(id, new_id(&mut first));
    }
}
