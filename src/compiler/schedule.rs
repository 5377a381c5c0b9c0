//! Action scheduling. Joins/exits anchored to the route boundary tokens are
//! moved to the front/back of the schedule; everything else keeps its
//! original relative order so every chained-reference read still follows its
//! write. Maximal runs of neighbouring plain swaps then collapse into a
//! single batch-swap action, which is what minimizes the call count.

use alloy_primitives::U256;

use super::model::{Action, ActionKind};

pub fn order_actions(
    actions: Vec<Action>,
    token_in_index: usize,
    token_out_index: usize,
) -> Vec<Action> {
    let mut enter_actions = Vec::new();
    let mut middle_actions = Vec::new();
    let mut exit_actions = Vec::new();

    for action in actions {
        let is_join_exit = matches!(action.kind, ActionKind::Join | ActionKind::Exit);
        // A join/exit consuming the route input depends on nothing and can
        // always run first; one producing the route output can always run
        // last. Everything else stays put.
        if is_join_exit && action.swaps[0].asset_in_index == token_in_index {
            enter_actions.push(action);
        } else if is_join_exit && action.swaps[0].asset_out_index == token_out_index {
            exit_actions.push(action);
        } else {
            middle_actions.push(action);
        }
    }

    let mut ordered = Vec::new();
    let mut batch = BatchRun::default();
    for action in enter_actions
        .into_iter()
        .chain(middle_actions)
        .chain(exit_actions)
    {
        match action.kind {
            ActionKind::Swap => batch.absorb(action),
            _ => {
                batch.flush_into(&mut ordered);
                ordered.push(action);
            }
        }
    }
    batch.flush_into(&mut ordered);
    ordered
}

/// Accumulates a run of neighbouring plain swaps into one batch-swap action.
#[derive(Default)]
struct BatchRun {
    swaps: Vec<super::model::SwapStep>,
    output_refs: Vec<super::chained_ref::OutputReference>,
    min_out: U256,
}

impl BatchRun {
    fn absorb(&mut self, action: Action) {
        self.swaps.extend(action.swaps);
        self.output_refs.extend(action.output_refs);
        self.min_out = action.min_out;
    }

    fn flush_into(&mut self, ordered: &mut Vec<Action>) {
        if self.swaps.is_empty() {
            return;
        }
        ordered.push(Action {
            kind: ActionKind::BatchSwap,
            swaps: std::mem::take(&mut self.swaps),
            output_refs: std::mem::take(&mut self.output_refs),
            min_out: std::mem::replace(&mut self.min_out, U256::ZERO),
        });
    }
}
