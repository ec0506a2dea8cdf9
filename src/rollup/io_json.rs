// Voter rosters saved from the voter endpoint.

use voter_households::roster::{paginate, RosterSource};

use crate::rollup::*;

/// What can be found in a roster file: either a full response of the endpoint,
/// or just the list of voters.
#[derive(PartialEq, Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RosterFile {
    Page(VoterPage),
    Bare(Vec<VoterRecord>),
}

pub fn parse_roster(contents: &str) -> Result<VoterPage, serde_json::Error> {
    let rf: RosterFile = serde_json::from_str(contents)?;
    Ok(match rf {
        RosterFile::Page(p) => p,
        RosterFile::Bare(voters) => {
            let n = voters.len() as u32;
            VoterPage {
                success: true,
                voters,
                pagination: Pagination {
                    current_page: 1,
                    total_pages: 1,
                    total_voters: n,
                },
            }
        }
    })
}

/// Serves a saved roster page by page, like the backend would.
pub struct JsonFileRoster {
    path: String,
    snapshot: Option<VoterPage>,
}

impl JsonFileRoster {
    pub fn new(path: &str) -> JsonFileRoster {
        JsonFileRoster {
            path: path.to_string(),
            snapshot: None,
        }
    }

    fn load(&mut self) -> Result<&VoterPage, RosterError> {
        if self.snapshot.is_none() {
            info!("Attempting to read roster file {:?}", self.path);
            let contents = fs::read_to_string(&self.path)
                .map_err(|e| RosterError::Source(format!("{}: {}", self.path, e)))?;
            let page = parse_roster(contents.as_str())
                .map_err(|e| RosterError::Source(format!("{}: {}", self.path, e)))?;
            debug!(
                "JsonFileRoster: {:?}: {} voters, pagination {:?}",
                self.path,
                page.voters.len(),
                page.pagination
            );
            self.snapshot = Some(page);
        }
        self.snapshot
            .as_ref()
            .ok_or_else(|| RosterError::Source(self.path.clone()))
    }
}

impl RosterSource for JsonFileRoster {
    fn fetch_page(
        &mut self,
        booth_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<VoterPage, RosterError> {
        let snapshot = self.load()?;
        if !snapshot.success {
            warn!("JsonFileRoster: booth {}: saved response is unsuccessful", booth_id);
            return Ok(VoterPage {
                success: false,
                voters: vec![],
                pagination: snapshot.pagination,
            });
        }
        Ok(paginate(&snapshot.voters, page, limit))
    }
}
