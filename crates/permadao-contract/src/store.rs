//! Proposal storage and the stake lifecycle.
//!
//! [`ProposalStore`] owns every proposal in creation order. Stake operations
//! move tokens between the [`Ledger`] and a proposal's per-voter stakes and
//! recompute the proposal's conviction with a [`ConvictionCalculator`].
//!
//! Each operation runs all of its checks first, in a fixed order, then
//! performs at most one fallible write (to the ledger) before the
//! infallible proposal updates. A returned error always leaves both the
//! ledger and the store untouched.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use permadao_core::address::is_well_formed;
use permadao_core::constants::{
    CONTENT_TYPE_TAG, MANIFEST_CONTENT_TYPE, MAX_PROPOSAL_NAME_LEN, TIME_UNIT, URL_SCHEME_PREFIX,
};
use permadao_core::traits::{BlockContext, ConvictionCalculator, TagResolver};
use permadao_core::{Address, ContractError, Ledger, Proposal, ProposalMetadata, ProposalStatus};

/// Unvalidated proposal fields as received from a caller.
///
/// `None` stands for an argument that was absent or not a string.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProposalDraft<'a> {
    pub name: Option<&'a str>,
    pub version: Option<&'a str>,
    pub url: Option<&'a str>,
    pub content_reference: Option<&'a str>,
}

/// All proposals, indexed by id.
#[derive(
    Serialize, Deserialize, Clone, Debug, Default, PartialEq,
    bincode::Encode, bincode::Decode,
)]
#[serde(transparent)]
pub struct ProposalStore(Vec<Proposal>);

impl ProposalStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Look up a proposal.
    ///
    /// # Errors
    ///
    /// [`ContractError::InvalidProposalId`] if no proposal has this id.
    pub fn get(&self, id: u64) -> Result<&Proposal, ContractError> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.0.get(i))
            .ok_or(ContractError::InvalidProposalId(id))
    }

    fn get_mut(&mut self, id: u64) -> Result<&mut Proposal, ContractError> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.0.get_mut(i))
            .ok_or(ContractError::InvalidProposalId(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Proposal> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of `total_staked` over all proposals, `None` on overflow.
    pub fn total_staked(&self) -> Option<u64> {
        self.0
            .iter()
            .try_fold(0u64, |acc, p| acc.checked_add(p.total_staked))
    }

    /// Check that `creator` may open a proposal: known, with a nonzero balance.
    fn check_proposer(ledger: &Ledger, creator: &Address) -> Result<(), ContractError> {
        match ledger.entry(creator) {
            None => Err(ContractError::UnknownCaller),
            Some(0) => Err(ContractError::InsufficientBalance { have: 0, need: 1 }),
            Some(_) => Ok(()),
        }
    }

    /// Validate a draft and append it as a new active proposal.
    ///
    /// Checks, in order: proposer, name, version, url, url scheme, content
    /// reference shape, then the reference's `Content-Type` tag via the host.
    /// Returns the new proposal's id.
    ///
    /// # Errors
    ///
    /// - [`ContractError::UnknownCaller`] / [`ContractError::InsufficientBalance`]
    ///   if the creator is unknown or holds no tokens
    /// - [`ContractError::InvalidString`] for a missing name, version or url,
    ///   or a name longer than 25 characters
    /// - [`ContractError::InvalidUrl`] if the url is not `https://`
    /// - [`ContractError::InvalidReference`] if the reference is not 43 characters
    /// - [`ContractError::MissingTag`] if the lookup fails or has no `Content-Type`
    /// - [`ContractError::WrongContentType`] if the content is not a manifest
    pub fn create(
        &mut self,
        ledger: &Ledger,
        creator: &Address,
        draft: ProposalDraft<'_>,
        block: &dyn BlockContext,
        resolver: &dyn TagResolver,
    ) -> Result<u64, ContractError> {
        Self::check_proposer(ledger, creator)?;

        let name = draft
            .name
            .filter(|n| n.chars().count() <= MAX_PROPOSAL_NAME_LEN)
            .ok_or(ContractError::InvalidString("name"))?;
        let version = draft.version.ok_or(ContractError::InvalidString("version"))?;
        let url = draft.url.ok_or(ContractError::InvalidString("url"))?;
        if !url.starts_with(URL_SCHEME_PREFIX) {
            return Err(ContractError::InvalidUrl);
        }
        let reference = draft
            .content_reference
            .filter(|r| is_well_formed(r))
            .ok_or_else(|| {
                ContractError::InvalidReference(draft.content_reference.unwrap_or_default().into())
            })?;

        check_manifest(resolver, reference)?;

        let id = self.0.len() as u64;
        let metadata = ProposalMetadata {
            name: name.to_string(),
            version: version.to_string(),
            url: url.to_string(),
            content_reference: reference.to_string(),
        };
        let pid = block.transaction_id().to_string();
        self.0.push(Proposal::new(id, pid, creator.clone(), metadata));

        info!(id, %creator, proposal_name = name, "proposal created");
        Ok(id)
    }

    /// Lock `amount` of `staker`'s tokens on proposal `id`.
    ///
    /// Only active proposals accept stake. The proposal's conviction is
    /// recomputed at `height`.
    ///
    /// # Errors
    ///
    /// Checked in this order:
    /// - [`ContractError::InvalidProposalId`]
    /// - [`ContractError::ProposalNotActive`] if canceled or executed
    /// - [`ContractError::UnknownCaller`] if the staker has no ledger entry
    /// - [`ContractError::InsufficientBalance`] if `amount` exceeds the balance
    /// - [`ContractError::InvalidAmount`] if `amount` is zero
    pub fn stake(
        &mut self,
        ledger: &mut Ledger,
        calculator: &dyn ConvictionCalculator,
        id: u64,
        staker: &Address,
        amount: u64,
        height: u64,
    ) -> Result<&Proposal, ContractError> {
        let proposal = self.get_mut(id)?;
        if proposal.status.is_terminal() {
            return Err(ContractError::ProposalNotActive(id));
        }
        let have = ledger.entry(staker).ok_or(ContractError::UnknownCaller)?;
        if amount > have {
            return Err(ContractError::InsufficientBalance { have, need: amount });
        }
        if amount == 0 {
            return Err(ContractError::InvalidAmount);
        }

        let old_total = proposal.total_staked;
        let new_total = old_total
            .checked_add(amount)
            .ok_or(ContractError::ArithmeticOverflow)?;
        let voter_stake = proposal
            .stake_of(staker)
            .checked_add(amount)
            .ok_or(ContractError::ArithmeticOverflow)?;

        ledger.debit(staker, amount)?;

        proposal.total_staked = new_total;
        proposal.stakes_by_voter.insert(staker.clone(), voter_stake);
        recompute(proposal, calculator, old_total, height);

        debug!(
            id,
            %staker,
            amount,
            total = new_total,
            conviction = proposal.conviction_last,
            "stake applied"
        );
        Ok(proposal)
    }

    /// Return `amount` of `staker`'s stake on proposal `id` to the ledger.
    ///
    /// Allowed on canceled proposals, so stake can always be withdrawn.
    ///
    /// # Errors
    ///
    /// Checked in this order:
    /// - [`ContractError::InvalidProposalId`]
    /// - [`ContractError::UnknownCaller`] if the staker has no ledger entry
    /// - [`ContractError::StakerNotFound`] if the staker holds no stake here
    /// - [`ContractError::InsufficientStake`] if `amount` exceeds the stake
    /// - [`ContractError::InvalidAmount`] if `amount` is zero
    pub fn unstake(
        &mut self,
        ledger: &mut Ledger,
        calculator: &dyn ConvictionCalculator,
        id: u64,
        staker: &Address,
        amount: u64,
        height: u64,
    ) -> Result<&Proposal, ContractError> {
        let proposal = self.get_mut(id)?;
        if !ledger.is_known(staker) {
            return Err(ContractError::UnknownCaller);
        }
        let have = match proposal.stake_of(staker) {
            0 => return Err(ContractError::StakerNotFound(id)),
            have => have,
        };
        if amount > have {
            return Err(ContractError::InsufficientStake { have, need: amount });
        }
        if amount == 0 {
            return Err(ContractError::InvalidAmount);
        }

        let old_total = proposal.total_staked;
        let new_total = old_total
            .checked_sub(amount)
            .ok_or(ContractError::ArithmeticOverflow)?;

        ledger.credit(staker, amount)?;

        proposal.total_staked = new_total;
        if have == amount {
            proposal.stakes_by_voter.remove(staker);
        } else {
            proposal.stakes_by_voter.insert(staker.clone(), have - amount);
        }
        recompute(proposal, calculator, old_total, height);

        debug!(
            id,
            %staker,
            amount,
            total = new_total,
            conviction = proposal.conviction_last,
            "unstake applied"
        );
        Ok(proposal)
    }

    /// Cancel proposal `id` on behalf of its creator.
    ///
    /// # Errors
    ///
    /// - [`ContractError::InvalidProposalId`]
    /// - [`ContractError::Unauthorized`] if `caller` is not the creator
    /// - [`ContractError::AlreadyCanceled`] if already canceled
    /// - [`ContractError::ProposalNotActive`] if executed
    pub fn cancel(&mut self, id: u64, caller: &Address) -> Result<(), ContractError> {
        let proposal = self.get_mut(id)?;
        if proposal.creator != *caller {
            return Err(ContractError::Unauthorized(id));
        }
        match proposal.status {
            ProposalStatus::Active => {}
            ProposalStatus::Canceled => return Err(ContractError::AlreadyCanceled(id)),
            ProposalStatus::Executed => return Err(ContractError::ProposalNotActive(id)),
        }
        proposal.status = ProposalStatus::Canceled;

        info!(id, %caller, "proposal canceled");
        Ok(())
    }
}

/// Confirm that `reference` names a content manifest.
///
/// Lookup failures count as a missing tag. With repeated `Content-Type`
/// tags the last one wins.
fn check_manifest(resolver: &dyn TagResolver, reference: &str) -> Result<(), ContractError> {
    let tags = resolver.resolve_tags(reference).map_err(|e| {
        debug!(reference, "content reference lookup failed: {e}");
        ContractError::MissingTag(CONTENT_TYPE_TAG)
    })?;
    let content_type = tags
        .iter()
        .rev()
        .find(|t| t.name == CONTENT_TYPE_TAG)
        .ok_or(ContractError::MissingTag(CONTENT_TYPE_TAG))?;
    if content_type.value != MANIFEST_CONTENT_TYPE {
        return Err(ContractError::WrongContentType(content_type.value.clone()));
    }
    Ok(())
}

/// Fold the stake change into the proposal's conviction.
///
/// `proposal.total_staked` must already hold the post-change stake. A proposal
/// that was never updated gets a baseline [`TIME_UNIT`] steps before `height`.
fn recompute(
    proposal: &mut Proposal,
    calculator: &dyn ConvictionCalculator,
    old_total: u64,
    height: u64,
) {
    if proposal.block_last == 0 {
        proposal.block_last = height.saturating_sub(TIME_UNIT);
    }
    let elapsed = height.saturating_sub(proposal.block_last);
    proposal.conviction_last = calculator.compute_conviction(
        elapsed,
        proposal.conviction_last,
        old_total,
        proposal.total_staked,
    );
    proposal.block_last = height;
}
