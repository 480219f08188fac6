//! Token-budget-aware prompt truncation.
//!
//! The algorithm is generic over the message type and three injected
//! strategies: a token counter over a message selection, a predicate marking
//! messages that must always be kept, and a partitioner grouping the
//! conversation into atomic turn units that are kept or dropped whole.
//! Backends add a policy, not a fork of the algorithm. This is the only place
//! truncation decisions are made; callers never re-truncate.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::message::ChatMessage;

/// Even the mandatory portion of the conversation does not fit the budget.
/// A typed outcome the caller branches on, not an unrecoverable fault.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TruncatePromptError {
    #[error(
        "Token count of the last message and all system messages ({token_count}) \
         exceeds the maximum prompt tokens ({budget})."
    )]
    MandatoryOverflow { token_count: usize, budget: usize },

    #[error(
        "Token count of the last message ({token_count}) \
         exceeds the maximum prompt tokens ({budget})."
    )]
    LastMessageOverflow { token_count: usize, budget: usize },
}

/// The canonical keep policy: every system message plus the final message.
pub fn default_keep_message(messages: &[ChatMessage], index: usize) -> bool {
    messages[index].is_system() || index + 1 == messages.len()
}

/// Select the maximal policy-valid suffix of `messages` that fits the budget.
///
/// Returns the indices to discard, in ascending order, never including a
/// mandatory message and never splitting a turn unit. `partition_messages`
/// yields unit sizes covering the whole conversation in order; units are
/// considered newest first and each is included whole while the running total
/// stays within budget. The effective budget is the smaller of the two limits
/// when both are present; with neither limit, nothing is discarded.
pub fn truncate_prompt<M, T, K, P>(
    messages: &[M],
    tokenize_messages: T,
    keep_message: K,
    partition_messages: P,
    model_limit: Option<usize>,
    user_limit: Option<usize>,
) -> Result<BTreeSet<usize>, TruncatePromptError>
where
    T: Fn(&[&M]) -> usize,
    K: Fn(&[M], usize) -> bool,
    P: Fn(&[M]) -> Vec<usize>,
{
    let budget = match (model_limit, user_limit) {
        (None, None) => return Ok(BTreeSet::new()),
        (Some(model), None) => model,
        (None, Some(user)) => user,
        (Some(model), Some(user)) => model.min(user),
    };

    let tokenize_kept = |kept: &BTreeSet<usize>| {
        let selection: Vec<&M> = kept.iter().map(|&index| &messages[index]).collect();
        tokenize_messages(&selection)
    };

    let mut kept: BTreeSet<usize> = (0..messages.len())
        .filter(|&index| keep_message(messages, index))
        .collect();

    let mandatory_tokens = tokenize_kept(&kept);
    if mandatory_tokens > budget {
        let last = messages.len().saturating_sub(1);
        let beyond_last = kept.iter().any(|&index| index != last);
        return Err(if beyond_last {
            TruncatePromptError::MandatoryOverflow {
                token_count: mandatory_tokens,
                budget,
            }
        } else {
            TruncatePromptError::LastMessageOverflow {
                token_count: mandatory_tokens,
                budget,
            }
        });
    }

    let sizes = partition_messages(messages);
    debug_assert_eq!(sizes.iter().sum::<usize>(), messages.len());

    let mut units = Vec::with_capacity(sizes.len());
    let mut start = 0;
    for size in sizes {
        units.push(start..start + size);
        start += size;
    }

    for unit in units.into_iter().rev() {
        let extra: Vec<usize> = unit.filter(|index| !kept.contains(index)).collect();
        if extra.is_empty() {
            continue;
        }

        let mut candidate = kept.clone();
        candidate.extend(extra.iter().copied());
        if tokenize_kept(&candidate) > budget {
            // Units are atomic: the first unit that does not fit whole stops
            // the walk, everything older is discarded with it.
            break;
        }
        kept = candidate;
    }

    Ok((0..messages.len())
        .filter(|index| !kept.contains(index))
        .collect())
}
