use crate::model::{Adjacent, Connections, Node, RoleClass};

/// What sits on one side of a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Neighbor {
    /// Opening of the root sequence.
    Origin,
    /// Opening of a branch; the owning step feeds it.
    BranchEntry,
    /// An occupied position.
    Step {
        role: RoleClass,
        accepts: Connections,
    },
    /// A placeholder slot. Imposes no constraint.
    Unknown,
    /// Nothing follows.
    Nothing,
}

impl Neighbor {
    pub fn of_role(role: RoleClass) -> Self {
        Neighbor::Step {
            role,
            accepts: Connections::for_role(role),
        }
    }

    fn of_node(node: &Node) -> Self {
        match node {
            Node::Step(step) => Neighbor::Step {
                role: step.role,
                accepts: step.connections(),
            },
            Node::Slot(_) => Neighbor::Unknown,
        }
    }

    /// The adjacency kind a candidate's connection rules are checked against.
    /// `None` means the side is unconstrained.
    pub fn adjacent(&self) -> Option<Adjacent> {
        match self {
            Neighbor::Origin => Some(Adjacent::Origin),
            Neighbor::BranchEntry => Some(Adjacent::BranchEntry),
            Neighbor::Step { role, .. } => Some(Adjacent::from(*role)),
            Neighbor::Unknown | Neighbor::Nothing => None,
        }
    }
}

/// Everything the validator needs to know about a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotContext {
    pub previous: Neighbor,
    pub next: Neighbor,
    pub is_first: bool,
    pub is_last: bool,
    pub in_branch: bool,
    /// A START step exists in the sequence, not counting the occupant.
    pub sequence_has_start: bool,
    /// An END step exists in the sequence, not counting the occupant.
    pub sequence_has_end: bool,
    /// Role of the step being replaced; `None` for inserts and slot fills.
    pub replacing: Option<RoleClass>,
}

impl SlotContext {
    /// Context for a new entry spliced in at `index` (`0..=sequence.len()`).
    pub fn insertion(sequence: &[Node], index: usize, in_branch: bool) -> Self {
        Self {
            previous: previous_of(sequence, index, in_branch),
            next: sequence.get(index).map(Neighbor::of_node).unwrap_or(Neighbor::Nothing),
            is_first: index == 0,
            is_last: index >= sequence.len(),
            in_branch,
            sequence_has_start: has_role(sequence, RoleClass::Start, None),
            sequence_has_end: has_role(sequence, RoleClass::End, None),
            replacing: None,
        }
    }

    /// Context for substituting the entry currently at `index`.
    pub fn occupying(sequence: &[Node], index: usize, in_branch: bool) -> Self {
        Self {
            previous: previous_of(sequence, index, in_branch),
            next: sequence
                .get(index + 1)
                .map(Neighbor::of_node)
                .unwrap_or(Neighbor::Nothing),
            is_first: index == 0,
            is_last: index + 1 >= sequence.len(),
            in_branch,
            sequence_has_start: has_role(sequence, RoleClass::Start, Some(index)),
            sequence_has_end: has_role(sequence, RoleClass::End, Some(index)),
            replacing: sequence.get(index).and_then(Node::role),
        }
    }
}

/// Whether the entries on either side of a gap at `index` accept each other.
///
/// Used after a removal: `index` is where the removed entry was.
pub(crate) fn gap_is_compatible(sequence: &[Node], index: usize, in_branch: bool) -> bool {
    let previous = previous_of(sequence, index, in_branch);
    let Some(Node::Step(next)) = sequence.get(index) else {
        return true;
    };
    let Some(before) = previous.adjacent() else {
        return true;
    };
    if !next.connections().accepts_before(before) {
        return false;
    }
    match &previous {
        Neighbor::Step { accepts, .. } => accepts.accepts_after(Adjacent::from(next.role)),
        _ => true,
    }
}

fn previous_of(sequence: &[Node], index: usize, in_branch: bool) -> Neighbor {
    if index == 0 {
        if in_branch {
            Neighbor::BranchEntry
        } else {
            Neighbor::Origin
        }
    } else {
        sequence
            .get(index - 1)
            .map(Neighbor::of_node)
            .unwrap_or(Neighbor::Unknown)
    }
}

fn has_role(sequence: &[Node], role: RoleClass, skip: Option<usize>) -> bool {
    sequence
        .iter()
        .enumerate()
        .any(|(i, node)| Some(i) != skip && node.role() == Some(role))
}
