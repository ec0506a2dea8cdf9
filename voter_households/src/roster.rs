//! Fetching the complete roster of a booth.
//!
//! The voter endpoint is paginated. Instead of walking all the pages, a first
//! request with a limit of 1 returns the total number of voters, and a second
//! request asks for all of them at once.

use log::{debug, info, warn};

use crate::config::*;

/// Anything that can serve pages of voters for a booth.
pub trait RosterSource {
    /// Returns the given page (1-based) with at most `limit` voters.
    fn fetch_page(&mut self, booth_id: &str, page: u32, limit: u32)
        -> Result<VoterPage, RosterError>;
}

fn check_page(page: VoterPage, booth_id: &str, page_num: u32) -> Result<VoterPage, RosterError> {
    if page.success {
        Ok(page)
    } else {
        Err(RosterError::Unsuccessful {
            booth_id: booth_id.to_string(),
            page: page_num,
        })
    }
}

/// A complete roster, with the total announced by the server.
#[derive(PartialEq, Debug, Clone)]
pub struct FullRoster {
    pub voters: Vec<VoterRecord>,
    pub total_voters: u32,
}

/// Fetches all the voters of a booth.
pub fn fetch_full_roster<S: RosterSource + ?Sized>(
    source: &mut S,
    booth_id: &str,
) -> Result<FullRoster, RosterError> {
    let probe = check_page(source.fetch_page(booth_id, 1, 1)?, booth_id, 1)?;
    let total = probe.pagination.total_voters;
    debug!(
        "fetch_full_roster: booth {}: server reports {} voters",
        booth_id, total
    );
    if total == 0 {
        return Ok(FullRoster {
            voters: probe.voters,
            total_voters: 0,
        });
    }

    let first = check_page(source.fetch_page(booth_id, 1, total)?, booth_id, 1)?;
    let total_pages = first.pagination.total_pages.max(1);
    let mut voters = first.voters;

    // The server may cap the page size below the requested limit.
    let mut page = 1;
    while (voters.len() as u32) < total && page < total_pages {
        page += 1;
        warn!(
            "fetch_full_roster: booth {}: page size capped, fetching page {}/{}",
            booth_id, page, total_pages
        );
        let next = check_page(source.fetch_page(booth_id, page, total)?, booth_id, page)?;
        if next.voters.is_empty() {
            break;
        }
        voters.extend(next.voters);
    }

    if (voters.len() as u32) < total {
        return Err(RosterError::Incomplete {
            expected: total,
            received: voters.len() as u32,
        });
    }
    info!(
        "fetch_full_roster: booth {}: {} voters fetched",
        booth_id,
        voters.len()
    );
    Ok(FullRoster {
        voters,
        total_voters: total,
    })
}

/// A source holding a roster in memory and paginating it the way the backend does.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct InMemoryRoster {
    pub voters: Vec<VoterRecord>,
    /// Largest page size served, if any.
    pub max_page_size: Option<u32>,
    /// Number of pages served so far.
    pub requests: u32,
}

impl InMemoryRoster {
    pub fn new(voters: Vec<VoterRecord>) -> InMemoryRoster {
        InMemoryRoster {
            voters,
            max_page_size: None,
            requests: 0,
        }
    }
}

/// Slices one page out of a complete roster.
pub fn paginate(voters: &[VoterRecord], page: u32, limit: u32) -> VoterPage {
    let limit = limit.max(1);
    let total = voters.len() as u32;
    let total_pages = (total + limit - 1) / limit;
    let start = (page.max(1) - 1).saturating_mul(limit) as usize;
    let end = (start + limit as usize).min(voters.len());
    let slice = if start < voters.len() {
        voters[start..end].to_vec()
    } else {
        Vec::new()
    };
    VoterPage {
        success: true,
        voters: slice,
        pagination: Pagination {
            current_page: page,
            total_pages,
            total_voters: total,
        },
    }
}

impl RosterSource for InMemoryRoster {
    fn fetch_page(
        &mut self,
        _booth_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<VoterPage, RosterError> {
        self.requests += 1;
        let limit = match self.max_page_size {
            Some(m) => limit.min(m),
            None => limit,
        };
        Ok(paginate(&self.voters, page, limit))
    }
}
