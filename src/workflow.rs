// The publish workflow: one sequential chain of stages, each feeding the
// next. State is carried in plain values (`SessionToken`,
// `AssetCoordinates`, `PublishPlan`) rather than shared globals.

use crate::api::{Credentials, ExchangeApi, Organization, SessionToken};
use crate::artifact::{ArtifactKind, AssetCoordinates};
use crate::error::{PublishError, Result};
use crate::files;
use crate::ui::{self, Choice, Prompter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Organization whose members type the group id by hand instead of
/// having it looked up.
pub const MANUAL_GROUP_ORGANIZATION_ID: &str = "68ef9520-24e9-4cf2-b2f5-620025690913";

/// Above this many organizations a separator closes the list.
pub const SEPARATOR_THRESHOLD: usize = 9;

pub const USERNAME_PROMPT: &str = "Username";
pub const PASSWORD_PROMPT: &str = "Password";
pub const ORGANIZATION_PROMPT: &str = "Select organization";
pub const GROUP_ID_PROMPT: &str = "Enter group id";
pub const ASSET_ID_PROMPT: &str = "Enter asset id";
pub const VERSION_PROMPT: &str = "Enter asset version";

/// User-supplied identity of the asset being published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDescriptor {
    pub asset_id: String,
    pub version: String,
}

/// A local file chosen for one artifact kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFile {
    pub kind: ArtifactKind,
    pub path: PathBuf,
}

/// Everything the upload stage needs, assembled by the earlier stages.
#[derive(Debug, Clone)]
pub struct PublishPlan {
    pub token: SessionToken,
    pub coordinates: AssetCoordinates,
    pub files: Vec<ArtifactFile>,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub coordinates: AssetCoordinates,
    pub uploaded: Vec<String>,
}

/// Choice rows for the organization prompt, in membership order.
pub fn organization_choices(organizations: &[Organization]) -> Vec<Choice> {
    let mut choices: Vec<Choice> = organizations
        .iter()
        .map(|org| Choice::item(org.name.clone()))
        .collect();
    if choices.len() > SEPARATOR_THRESHOLD {
        choices.push(Choice::Separator);
    }
    choices
}

pub struct Publisher<'a, A, P> {
    api: &'a A,
    prompter: &'a P,
    maven_base: String,
    work_dir: PathBuf,
}

impl<'a, A: ExchangeApi, P: Prompter> Publisher<'a, A, P> {
    pub fn new(api: &'a A, prompter: &'a P, maven_base: impl Into<String>, work_dir: impl Into<PathBuf>) -> Self {
        Publisher {
            api,
            prompter,
            maven_base: maven_base.into(),
            work_dir: work_dir.into(),
        }
    }

    /// Run every stage in order. The first failure ends the run.
    pub fn run(&self) -> Result<PublishReport> {
        let credentials = self.obtain_credentials()?;
        let token = self.authenticate(&credentials)?;
        let organizations = self.fetch_organizations(&token)?;
        let organization = self.select_organization(&organizations)?;
        let group_id = self.resolve_group(&token, organization)?;
        let asset = self.enter_asset()?;

        let coordinates = AssetCoordinates {
            organization_id: organization.id.clone(),
            group_id,
            asset_id: asset.asset_id,
            version: asset.version,
        };
        let files = self.select_files()?;

        self.upload_all(PublishPlan {
            token,
            coordinates,
            files,
        })
    }

    fn obtain_credentials(&self) -> Result<Credentials> {
        let username = self.prompter.input(USERNAME_PROMPT)?;
        let password = self.prompter.password(PASSWORD_PROMPT)?;
        Ok(Credentials { username, password })
    }

    fn authenticate(&self, credentials: &Credentials) -> Result<SessionToken> {
        let spinner = ui::spinner("Logging in...");
        let result = self.api.login(credentials);
        spinner.finish_and_clear();
        let token = result?;
        info!(username = %credentials.username, "authenticated");
        Ok(token)
    }

    fn fetch_organizations(&self, token: &SessionToken) -> Result<Vec<Organization>> {
        let spinner = ui::spinner("Fetching organizations...");
        let result = self.api.user_profile(token);
        spinner.finish_and_clear();
        let profile = result?;
        let organizations = profile.user.contributor_of_organizations;
        debug!(count = organizations.len(), "fetched organizations");
        if organizations.is_empty() {
            return Err(PublishError::NoOrganizations);
        }
        Ok(organizations)
    }

    fn select_organization<'o>(&self, organizations: &'o [Organization]) -> Result<&'o Organization> {
        let choices = organization_choices(organizations);
        let index = self.prompter.select(ORGANIZATION_PROMPT, &choices)?;
        let organization = organizations
            .get(index)
            .ok_or(PublishError::InvalidSelection(index))?;
        debug!(id = %organization.id, name = %organization.name, "organization selected");
        Ok(organization)
    }

    /// Group id for the organization: typed by hand for the manual-entry
    /// organization, otherwise the first group the exchange API lists.
    fn resolve_group(&self, token: &SessionToken, organization: &Organization) -> Result<String> {
        if organization.id == MANUAL_GROUP_ORGANIZATION_ID {
            return self.required_input(GROUP_ID_PROMPT, "group id");
        }

        let spinner = ui::spinner("Fetching groups...");
        let result = self.api.groups(token, &organization.id);
        spinner.finish_and_clear();
        let groups = result?;
        let first = groups
            .into_iter()
            .next()
            .ok_or_else(|| PublishError::NoGroups {
                organization_id: organization.id.clone(),
            })?;
        debug!(group_id = %first.group_id, "using first group");
        Ok(first.group_id)
    }

    fn enter_asset(&self) -> Result<AssetDescriptor> {
        let asset_id = self.required_input(ASSET_ID_PROMPT, "asset id")?;
        let version = self.required_input(VERSION_PROMPT, "asset version")?;
        Ok(AssetDescriptor { asset_id, version })
    }

    fn required_input(&self, prompt: &str, field: &'static str) -> Result<String> {
        let answer = self.prompter.input(prompt)?.trim().to_string();
        if answer.is_empty() {
            return Err(PublishError::EmptyInput { field });
        }
        Ok(answer)
    }

    /// Pick one local file per artifact kind. Every required kind is
    /// chosen before anything is uploaded.
    fn select_files(&self) -> Result<Vec<ArtifactFile>> {
        let entries = files::list_entries(&self.work_dir)?;
        let mut selected = Vec::new();

        for kind in ArtifactKind::ALL {
            let candidates = files::filter_by_marker(&entries, kind.marker());
            if candidates.is_empty() {
                if kind.is_required() {
                    return Err(PublishError::NoCandidates {
                        marker: kind.marker(),
                        dir: self.work_dir.display().to_string(),
                    });
                }
                debug!(%kind, "no candidate file");
                println!("No {} file found, skipping.", kind);
                continue;
            }

            let choices: Vec<Choice> = candidates
                .iter()
                .map(|file| Choice::item(file.label.as_str()))
                .collect();
            let index = self.prompter.select(kind.prompt(), &choices)?;
            let file = candidates
                .get(index)
                .ok_or(PublishError::InvalidSelection(index))?;
            selected.push(ArtifactFile {
                kind,
                path: file.path_in(&self.work_dir),
            });
        }
        Ok(selected)
    }

    fn upload_all(&self, plan: PublishPlan) -> Result<PublishReport> {
        let mut uploaded = Vec::with_capacity(plan.files.len());
        for file in &plan.files {
            let url = plan.coordinates.upload_url(&self.maven_base, file.kind);
            self.upload_one(&plan.token, &url, &file.path, file.kind)?;
            uploaded.push(url);
        }
        Ok(PublishReport {
            coordinates: plan.coordinates,
            uploaded,
        })
    }

    fn upload_one(&self, token: &SessionToken, url: &str, path: &Path, kind: ArtifactKind) -> Result<()> {
        let spinner = ui::spinner(format!("Uploading {}...", kind));
        match self.api.upload(token, url, path) {
            Ok(()) => {
                spinner.finish_with_message(format!("Uploaded {}", kind));
                info!(%kind, url, "uploaded");
                Ok(())
            }
            Err(e) => {
                spinner.finish_and_clear();
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Group, MockExchangeApi, User, UserProfile};
    use crate::ui::MockPrompter;
    use std::fs;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    const MAVEN: &str = "http://maven.test";
    const TOKEN: &str = "tok-123";

    fn org(id: &str, name: &str) -> Organization {
        Organization { id: id.into(), name: name.into() }
    }

    fn work_dir(names: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in names {
            fs::write(dir.path().join(name), b"content").unwrap();
        }
        dir
    }

    /// Prompter answering every prompt of a full run. Selections are made
    /// by label so tests do not depend on listing order.
    fn prompter(org_name: &'static str, group_id: Option<&'static str>) -> MockPrompter {
        let mut prompter = MockPrompter::new();
        prompter
            .expect_input()
            .withf(|prompt: &str| prompt == USERNAME_PROMPT)
            .returning(|_| Ok("jdoe".into()));
        prompter
            .expect_password()
            .returning(|_| Ok("secret".into()));
        if let Some(group_id) = group_id {
            prompter
                .expect_input()
                .withf(|prompt: &str| prompt == GROUP_ID_PROMPT)
                .times(1)
                .returning(move |_| Ok(group_id.into()));
        }
        prompter
            .expect_input()
            .withf(|prompt: &str| prompt == ASSET_ID_PROMPT)
            .returning(|_| Ok("a".into()));
        prompter
            .expect_input()
            .withf(|prompt: &str| prompt == VERSION_PROMPT)
            .returning(|_| Ok(" 1.0 ".into()));
        prompter
            .expect_select()
            .withf(|prompt: &str, _: &[Choice]| prompt == ORGANIZATION_PROMPT)
            .returning(move |_, choices| pick(choices, org_name));
        prompter
            .expect_select()
            .withf(|prompt: &str, _: &[Choice]| prompt != ORGANIZATION_PROMPT)
            .returning(|_, choices| Ok(first_item(choices)));
        prompter
    }

    fn pick(choices: &[Choice], label: &str) -> Result<usize> {
        choices
            .iter()
            .position(|c| *c == Choice::item(label))
            .ok_or(PublishError::InvalidSelection(usize::MAX))
    }

    fn first_item(choices: &[Choice]) -> usize {
        choices
            .iter()
            .position(|c| matches!(c, Choice::Item(_)))
            .unwrap()
    }

    /// Api answering login/profile and recording upload URLs.
    fn api(organizations: Vec<Organization>, uploads: Arc<Mutex<Vec<String>>>) -> MockExchangeApi {
        let mut api = MockExchangeApi::new();
        api.expect_login()
            .withf(|c: &Credentials| c.username == "jdoe" && c.password == "secret")
            .times(1)
            .returning(|_| Ok(SessionToken::new(TOKEN)));
        api.expect_user_profile()
            .withf(|t: &SessionToken| t.as_str() == TOKEN)
            .times(1)
            .returning(move |_| {
                Ok(UserProfile {
                    user: User { contributor_of_organizations: organizations.clone() },
                })
            });
        api.expect_upload()
            .withf(|t: &SessionToken, _: &str, path: &Path| t.as_str() == TOKEN && path.exists())
            .returning(move |_, url, _| {
                uploads.lock().unwrap().push(url.to_string());
                Ok(())
            });
        api
    }

    #[test]
    fn test_end_to_end_uploads_three_artifacts_in_order() {
        let dir = work_dir(&["a.pom", "a.jar", "a-studio-plugin.zip", "notes.txt"]);
        let uploads = Arc::new(Mutex::new(Vec::new()));

        let mut api = api(vec![org("org-1", "Acme")], uploads.clone());
        api.expect_groups()
            .withf(|t: &SessionToken, org_id: &str| t.as_str() == TOKEN && org_id == "org-1")
            .times(1)
            .returning(|_, _| Ok(vec![Group { group_id: "g-1".into() }]));
        let prompter = prompter("Acme", None);

        let report = Publisher::new(&api, &prompter, MAVEN, dir.path()).run().unwrap();

        let uploads = uploads.lock().unwrap().clone();
        assert_eq!(uploads.len(), 3);
        assert!(uploads[0].ends_with("/a/1.0/a-1.0.pom"));
        assert!(uploads[1].ends_with("/a/1.0/a-1.0.jar"));
        assert!(uploads[2].ends_with("/a/1.0/a-1.0-studio-plugin.zip"));
        assert_eq!(
            uploads[0],
            "http://maven.test/api/v1/organizations/org-1/maven/g-1/a/1.0/a-1.0.pom"
        );
        assert_eq!(report.uploaded, uploads);
        assert_eq!(report.coordinates.version, "1.0");
    }

    #[test]
    fn test_first_group_is_selected() {
        let dir = work_dir(&["a.pom", "a.jar", "a-studio-plugin.zip"]);
        let uploads = Arc::new(Mutex::new(Vec::new()));

        let mut api = api(vec![org("org-1", "Acme"), org("org-2", "Other")], uploads.clone());
        api.expect_groups()
            .withf(|_: &SessionToken, org_id: &str| org_id == "org-2")
            .times(1)
            .returning(|_, _| {
                Ok(vec![
                    Group { group_id: "first".into() },
                    Group { group_id: "second".into() },
                ])
            });
        let prompter = prompter("Other", None);

        let report = Publisher::new(&api, &prompter, MAVEN, dir.path()).run().unwrap();

        assert_eq!(report.coordinates.group_id, "first");
        assert_eq!(report.coordinates.organization_id, "org-2");
        assert!(uploads.lock().unwrap()[0].contains("/organizations/org-2/maven/first/"));
    }

    #[test]
    fn test_manual_group_organization_skips_group_lookup() {
        let dir = work_dir(&["a.pom", "a.jar", "a-studio-plugin.zip"]);
        let uploads = Arc::new(Mutex::new(Vec::new()));

        let mut api = api(
            vec![org("org-1", "Acme"), org(MANUAL_GROUP_ORGANIZATION_ID, "MuleSoft")],
            uploads.clone(),
        );
        api.expect_groups().never();
        let prompter = prompter("MuleSoft", Some("org.mule.connectors"));

        let report = Publisher::new(&api, &prompter, MAVEN, dir.path()).run().unwrap();

        assert_eq!(report.coordinates.group_id, "org.mule.connectors");
        assert!(uploads.lock().unwrap()[0].contains("/maven/org.mule.connectors/a/1.0/"));
    }

    #[test]
    fn test_invalid_credentials_stop_the_run() {
        let dir = work_dir(&["a.pom"]);
        // No expectations besides login: any further call would panic.
        let mut api = MockExchangeApi::new();
        api.expect_login()
            .times(1)
            .returning(|_| Err(PublishError::InvalidCredentials));
        let mut prompter = MockPrompter::new();
        prompter.expect_input().returning(|_| Ok("jdoe".into()));
        prompter.expect_password().returning(|_| Ok("wrong".into()));

        let err = Publisher::new(&api, &prompter, MAVEN, dir.path()).run().unwrap_err();

        assert_eq!(err.user_message(), "Invalid credentials");
    }

    #[test]
    fn test_conflict_on_final_upload() {
        let dir = work_dir(&["a.pom", "a.jar", "a-studio-plugin.zip"]);
        let attempted = Arc::new(Mutex::new(Vec::new()));
        let recorded = attempted.clone();

        let mut api = MockExchangeApi::new();
        api.expect_login().returning(|_| Ok(SessionToken::new(TOKEN)));
        api.expect_user_profile().returning(|_| {
            Ok(UserProfile {
                user: User { contributor_of_organizations: vec![org("org-1", "Acme")] },
            })
        });
        api.expect_groups()
            .returning(|_, _| Ok(vec![Group { group_id: "g".into() }]));
        api.expect_upload().times(3).returning(move |_, url, _| {
            recorded.lock().unwrap().push(url.to_string());
            if url.ends_with("-studio-plugin.zip") {
                Err(PublishError::VersionConflict)
            } else {
                Ok(())
            }
        });
        let prompter = prompter("Acme", None);

        let err = Publisher::new(&api, &prompter, MAVEN, dir.path()).run().unwrap_err();

        assert_eq!(
            err.user_message(),
            "Conflict error, the asset version already exists."
        );
        assert_eq!(attempted.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_failed_upload_stops_remaining_uploads() {
        let dir = work_dir(&["a.pom", "a.jar", "a-studio-plugin.zip"]);

        let mut api = MockExchangeApi::new();
        api.expect_login().returning(|_| Ok(SessionToken::new(TOKEN)));
        api.expect_user_profile().returning(|_| {
            Ok(UserProfile {
                user: User { contributor_of_organizations: vec![org("org-1", "Acme")] },
            })
        });
        api.expect_groups()
            .returning(|_, _| Ok(vec![Group { group_id: "g".into() }]));
        api.expect_upload()
            .times(1)
            .returning(|_, _, _| Err(PublishError::InsufficientPermissions));
        let prompter = prompter("Acme", None);

        let err = Publisher::new(&api, &prompter, MAVEN, dir.path()).run().unwrap_err();

        assert!(matches!(err, PublishError::InsufficientPermissions));
    }

    #[test]
    fn test_missing_jar_is_skipped() {
        let dir = work_dir(&["a.pom", "a-studio-plugin.zip"]);
        let uploads = Arc::new(Mutex::new(Vec::new()));

        let mut api = api(vec![org("org-1", "Acme")], uploads.clone());
        api.expect_groups()
            .returning(|_, _| Ok(vec![Group { group_id: "g".into() }]));
        let prompter = prompter("Acme", None);

        Publisher::new(&api, &prompter, MAVEN, dir.path()).run().unwrap();

        let uploads = uploads.lock().unwrap();
        assert_eq!(uploads.len(), 2);
        assert!(uploads[0].ends_with("a-1.0.pom"));
        assert!(uploads[1].ends_with("a-1.0-studio-plugin.zip"));
    }

    #[test]
    fn test_missing_pom_fails_before_any_upload() {
        let dir = work_dir(&["a.jar", "a-studio-plugin.zip"]);

        let mut api = MockExchangeApi::new();
        api.expect_login().returning(|_| Ok(SessionToken::new(TOKEN)));
        api.expect_user_profile().returning(|_| {
            Ok(UserProfile {
                user: User { contributor_of_organizations: vec![org("org-1", "Acme")] },
            })
        });
        api.expect_groups()
            .returning(|_, _| Ok(vec![Group { group_id: "g".into() }]));
        api.expect_upload().never();
        let prompter = prompter("Acme", None);

        let err = Publisher::new(&api, &prompter, MAVEN, dir.path()).run().unwrap_err();

        assert!(matches!(err, PublishError::NoCandidates { marker: ".pom", .. }));
    }

    #[test]
    fn test_file_prompt_offers_only_matching_names() {
        let dir = work_dir(&["a.pom", "b.pom", "a.jar", "a-studio-plugin.zip", "x.txt"]);
        let offered = Arc::new(Mutex::new(Vec::new()));
        let seen = offered.clone();

        let mut prompter = MockPrompter::new();
        prompter.expect_select().returning(move |prompt, choices| {
            seen.lock().unwrap().push((prompt.to_string(), choices.to_vec()));
            Ok(0)
        });
        let api = MockExchangeApi::new();

        let selected = Publisher::new(&api, &prompter, MAVEN, dir.path())
            .select_files()
            .unwrap();

        let offered = offered.lock().unwrap();
        assert_eq!(offered[0].0, "Select POM file");
        assert_eq!(offered[0].1, vec![Choice::item("a.pom"), Choice::item("b.pom")]);
        assert_eq!(offered[1].1, vec![Choice::item("a.jar")]);
        assert_eq!(offered[2].1, vec![Choice::item("a-studio-plugin.zip")]);
        assert_eq!(selected[0].path, dir.path().join("a.pom"));
    }

    #[test]
    fn test_empty_asset_id_is_rejected() {
        let mut prompter = MockPrompter::new();
        prompter.expect_input().returning(|_| Ok("   ".into()));
        let api = MockExchangeApi::new();

        let err = Publisher::new(&api, &prompter, MAVEN, ".").enter_asset().unwrap_err();

        assert!(matches!(err, PublishError::EmptyInput { field: "asset id" }));
    }

    #[test]
    fn test_separator_index_is_rejected() {
        let many: Vec<Organization> = (0..10).map(|i| org(&i.to_string(), &format!("Org {}", i))).collect();
        let mut prompter = MockPrompter::new();
        prompter
            .expect_select()
            .withf(|_: &str, choices: &[Choice]| choices.last() == Some(&Choice::Separator))
            .times(1)
            .returning(|_, choices| Ok(choices.len() - 1));
        let api = MockExchangeApi::new();

        let err = Publisher::new(&api, &prompter, MAVEN, ".")
            .select_organization(&many)
            .unwrap_err();

        assert!(matches!(err, PublishError::InvalidSelection(10)));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_file_name_is_selectable() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = work_dir(&["a.jar", "a-studio-plugin.zip"]);
        let raw = OsStr::from_bytes(b"caf\xe9.pom");
        fs::write(dir.path().join(raw), b"<project/>").unwrap();
        let mut prompter = MockPrompter::new();
        prompter.expect_select().returning(|_, _| Ok(0));
        let api = MockExchangeApi::new();

        let selected = Publisher::new(&api, &prompter, MAVEN, dir.path())
            .select_files()
            .unwrap();

        assert_eq!(selected[0].kind, ArtifactKind::Pom);
        assert_eq!(selected[0].path, dir.path().join(raw));
        assert!(selected[0].path.exists());
    }

    #[test]
    fn test_separator_appended_above_threshold() {
        let many: Vec<Organization> = (0..10).map(|i| org(&i.to_string(), &format!("Org {}", i))).collect();
        let choices = organization_choices(&many);

        assert_eq!(choices.len(), 11);
        assert_eq!(choices.iter().filter(|c| **c == Choice::Separator).count(), 1);
        assert_eq!(choices.last(), Some(&Choice::Separator));
    }

    #[test]
    fn test_no_separator_at_threshold() {
        let nine: Vec<Organization> = (0..9).map(|i| org(&i.to_string(), "Org")).collect();
        let choices = organization_choices(&nine);

        assert_eq!(choices.len(), 9);
        assert!(!choices.contains(&Choice::Separator));
    }
}
