//! Cross-module linking: program space construction, the dependency graph
//! and its strongly connected components, the data expander, the resolver,
//! and the lowering ladder down to SKI combinators.

mod data_expand;
mod driver;
mod graph;
mod ladder;
mod program_space;
mod resolver;
mod scc;

pub use data_expand::expand_data_declarations;
pub use driver::link;
pub use graph::{build_dependency_graph, Graph};
pub use ladder::{erase_poly_to_typed, erase_typed_to_untyped, lower_to_combinator, lower_to_untyped};
pub use program_space::{LoadedModule, ProgramSpace};
pub use resolver::resolve_cross_module_dependencies;
pub use scc::strongly_connected_components;
