pub mod provider_gate;

pub use provider_gate::ProviderGate;
