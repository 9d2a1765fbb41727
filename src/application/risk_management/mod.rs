// Trade safety gate
pub mod safety_gate;
