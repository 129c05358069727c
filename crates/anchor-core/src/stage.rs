use crate::error::IssueError;
use tokio::sync::RwLock;
use tracing::info;

/// Progress of one issuance through the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssuanceStage {
	Idle,
	BalanceChecked,
	Built,
	Signed,
	Verified,
	Broadcast,
	Done,
	Failed,
}

impl std::fmt::Display for IssuanceStage {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Idle => write!(f, "Idle"),
			Self::BalanceChecked => write!(f, "BalanceChecked"),
			Self::Built => write!(f, "Built"),
			Self::Signed => write!(f, "Signed"),
			Self::Verified => write!(f, "Verified"),
			Self::Broadcast => write!(f, "Broadcast"),
			Self::Done => write!(f, "Done"),
			Self::Failed => write!(f, "Failed"),
		}
	}
}

pub(crate) struct StageTracker {
	stage: RwLock<IssuanceStage>,
}

impl StageTracker {
	pub fn new() -> Self {
		Self {
			stage: RwLock::new(IssuanceStage::Idle),
		}
	}

	pub async fn get(&self) -> IssuanceStage {
		*self.stage.read().await
	}

	pub async fn set(&self, next: IssuanceStage) -> Result<(), IssueError> {
		let mut stage = self.stage.write().await;
		let current = *stage;

		if !is_valid_transition(current, next) {
			return Err(IssueError::InvalidStage {
				from: current,
				to: next,
			});
		}

		*stage = next;
		info!("Issuance stage changed: {} -> {}", current, next);

		Ok(())
	}
}

fn is_valid_transition(from: IssuanceStage, to: IssuanceStage) -> bool {
	use IssuanceStage::*;

	match (from, to) {
		(Idle, BalanceChecked) => true,
		(BalanceChecked, Built) => true,
		(Built, Signed) => true,
		(Signed, Verified) => true,
		(Verified, Broadcast) => true,
		(Broadcast, Done) => true,
		(Done | Failed, Idle) => true,
		(Failed, Failed) => false,
		(_, Failed) => true,
		_ => false,
	}
}
