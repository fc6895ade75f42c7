mod descriptor;


pub use descriptor::{SchemaDescriptor, SchemaError, SlotDescriptor};
