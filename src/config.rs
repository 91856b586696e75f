//! Tree configuration: key order and algorithm variant.

use crate::comparator::NaturalOrder;

/// Selects the recursive or explicit-stack variant of traversals and
/// rebuilds. Both variants produce the same sequences.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum IterationType {
    Recursive,
    #[default]
    Iterative,
}

#[derive(Clone, Debug)]
pub struct TreeOptions<C = NaturalOrder> {
    pub comparator: C,
    pub iteration_type: IterationType,
}

impl Default for TreeOptions<NaturalOrder> {
    fn default() -> Self {
        Self {
            comparator: NaturalOrder,
            iteration_type: IterationType::default(),
        }
    }
}

impl<C> TreeOptions<C> {
    pub fn new(comparator: C) -> Self {
        Self {
            comparator,
            iteration_type: IterationType::default(),
        }
    }

    pub fn iteration_type(mut self, iteration_type: IterationType) -> Self {
        self.iteration_type = iteration_type;
        self
    }

    /// Replace the comparator, keeping the other settings.
    pub fn comparator<C2>(self, comparator: C2) -> TreeOptions<C2> {
        TreeOptions {
            comparator,
            iteration_type: self.iteration_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::Reversed;

    #[test]
    fn builder_keeps_iteration_type_across_comparator_swap() {
        let opts = TreeOptions::default()
            .iteration_type(IterationType::Recursive)
            .comparator(Reversed(NaturalOrder));
        assert_eq!(opts.iteration_type, IterationType::Recursive);
        assert_eq!(TreeOptions::default().iteration_type, IterationType::Iterative);
    }
}
