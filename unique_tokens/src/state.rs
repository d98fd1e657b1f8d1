use chrono::{DateTime, Utc};
use opensea_client::UniqueTokenAsset;
use serde::{Deserialize, Serialize};

/// Unique token collection for the active account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UniqueTokensState {
    /// A network refresh is in flight
    pub fetching_unique_tokens: bool,
    /// The cached collection is being read
    pub loading_unique_tokens: bool,
    pub unique_tokens: Vec<UniqueTokenAsset>,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UniqueTokensAction {
    LoadRequest,
    LoadSuccess(Vec<UniqueTokenAsset>),
    LoadFailure,
    GetRequest,
    GetSuccess {
        unique_tokens: Vec<UniqueTokenAsset>,
        refreshed_at: DateTime<Utc>,
    },
    GetFailure,
    Clear,
}

impl UniqueTokensAction {
    pub fn name(&self) -> &'static str {
        match self {
            UniqueTokensAction::LoadRequest => "UNIQUE_TOKENS_LOAD_UNIQUE_TOKENS_REQUEST",
            UniqueTokensAction::LoadSuccess(_) => "UNIQUE_TOKENS_LOAD_UNIQUE_TOKENS_SUCCESS",
            UniqueTokensAction::LoadFailure => "UNIQUE_TOKENS_LOAD_UNIQUE_TOKENS_FAILURE",
            UniqueTokensAction::GetRequest => "UNIQUE_TOKENS_GET_UNIQUE_TOKENS_REQUEST",
            UniqueTokensAction::GetSuccess { .. } => "UNIQUE_TOKENS_GET_UNIQUE_TOKENS_SUCCESS",
            UniqueTokensAction::GetFailure => "UNIQUE_TOKENS_GET_UNIQUE_TOKENS_FAILURE",
            UniqueTokensAction::Clear => "UNIQUE_TOKENS_CLEAR_STATE",
        }
    }
}

/// Apply `action` to `state`
pub fn reduce(state: &UniqueTokensState, action: UniqueTokensAction) -> UniqueTokensState {
    match action {
        UniqueTokensAction::LoadRequest => UniqueTokensState {
            loading_unique_tokens: true,
            ..state.clone()
        },
        UniqueTokensAction::LoadSuccess(unique_tokens) => UniqueTokensState {
            loading_unique_tokens: false,
            unique_tokens,
            ..state.clone()
        },
        UniqueTokensAction::LoadFailure => UniqueTokensState {
            loading_unique_tokens: false,
            ..state.clone()
        },
        UniqueTokensAction::GetRequest => UniqueTokensState {
            fetching_unique_tokens: true,
            ..state.clone()
        },
        UniqueTokensAction::GetSuccess {
            unique_tokens,
            refreshed_at,
        } => UniqueTokensState {
            fetching_unique_tokens: false,
            unique_tokens,
            last_refreshed_at: Some(refreshed_at),
            ..state.clone()
        },
        UniqueTokensAction::GetFailure => UniqueTokensState {
            fetching_unique_tokens: false,
            ..state.clone()
        },
        UniqueTokensAction::Clear => UniqueTokensState::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(id: &str) -> UniqueTokenAsset {
        UniqueTokenAsset {
            token_id: Some(id.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_load_cycle() {
        let state = reduce(&UniqueTokensState::default(), UniqueTokensAction::LoadRequest);
        assert!(state.loading_unique_tokens);

        let state = reduce(&state, UniqueTokensAction::LoadSuccess(vec![token("1")]));
        assert!(!state.loading_unique_tokens);
        assert_eq!(state.unique_tokens.len(), 1);
        assert_eq!(state.last_refreshed_at, None);
    }

    #[test]
    fn test_failure_keeps_previous_tokens() {
        let state = UniqueTokensState {
            unique_tokens: vec![token("1"), token("2")],
            ..Default::default()
        };
        let state = reduce(&state, UniqueTokensAction::GetRequest);
        assert!(state.fetching_unique_tokens);

        let state = reduce(&state, UniqueTokensAction::GetFailure);
        assert!(!state.fetching_unique_tokens);
        assert_eq!(state.unique_tokens.len(), 2);

        let state = reduce(&state, UniqueTokensAction::LoadFailure);
        assert_eq!(state.unique_tokens.len(), 2);
    }

    #[test]
    fn test_get_success_records_refresh_time() {
        let now = Utc::now();
        let state = reduce(
            &UniqueTokensState::default(),
            UniqueTokensAction::GetSuccess {
                unique_tokens: vec![token("9")],
                refreshed_at: now,
            },
        );
        assert_eq!(state.last_refreshed_at, Some(now));
        assert_eq!(state.unique_tokens[0].token_id.as_deref(), Some("9"));
    }

    #[test]
    fn test_clear_resets_everything() {
        let state = UniqueTokensState {
            fetching_unique_tokens: true,
            loading_unique_tokens: true,
            unique_tokens: vec![token("1")],
            last_refreshed_at: Some(Utc::now()),
        };
        assert_eq!(
            reduce(&state, UniqueTokensAction::Clear),
            UniqueTokensState::default()
        );
    }
}
