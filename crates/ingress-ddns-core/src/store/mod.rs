// # Record Store Implementations
//
// Provider-independent implementations of the DnsRecordStore trait.

pub mod memory;

pub use memory::MemoryRecordStore;
