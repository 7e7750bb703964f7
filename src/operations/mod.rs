pub mod relax;

pub use relax::Relax;
