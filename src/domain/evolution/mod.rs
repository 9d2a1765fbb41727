// Genetic search domain
pub mod dna;
pub mod organism;
pub mod report;
