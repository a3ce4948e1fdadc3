//! GitHub repository provider

use async_trait::async_trait;
use provider_api::github::{
    CreateCommitRequest, CreateRepositoryRequest, CreateTreeRequest, GitCommit, GitObject, GitRef,
    OrgMembership, Repository, TreeEntry, UpdateRefRequest,
};
use tracing::{debug, info};

use crate::deploy::providers::RepositoryProvider;
use crate::errors::PublishError;
use crate::http::client::{encode, HttpClient};
use crate::models::provider::{CommitResult, FileEntry, RepositoryIdentity, RepositorySpec};

/// Headers every GitHub REST call carries
pub const GITHUB_HEADERS: &[(&str, &str)] = &[
    ("accept", "application/vnd.github+json"),
    ("x-github-api-version", "2022-11-28"),
];

/// GitHub REST client bound to one token
pub struct GitHubClient {
    http: HttpClient,
}

impl GitHubClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    async fn repository(&self, owner: &str, name: &str) -> Result<Repository, PublishError> {
        self.http.get(&repository_path(owner, name)).await
    }

    async fn create(
        &self,
        path: &str,
        spec: &RepositorySpec,
    ) -> Result<RepositoryIdentity, PublishError> {
        let body = CreateRepositoryRequest {
            name: spec.name.clone(),
            description: spec.description.clone(),
            private: spec.private,
            auto_init: spec.auto_init,
        };
        let repo: Repository = self.http.post(path, &body).await?;
        info!("Created repository {}", repo.full_name);
        Ok(identity(repo))
    }
}

fn repository_path(owner: &str, name: &str) -> String {
    format!("/repos/{}/{}", encode(owner), encode(name))
}

/// Branch names may contain `/`; each segment is encoded on its own
fn branch_path(branch: &str) -> String {
    branch.split('/').map(encode).collect::<Vec<_>>().join("/")
}

fn identity(repo: Repository) -> RepositoryIdentity {
    RepositoryIdentity {
        owner: repo.owner.login,
        name: repo.name,
        full_name: repo.full_name,
        url: repo.html_url,
        default_branch: repo.default_branch,
    }
}

#[async_trait]
impl RepositoryProvider for GitHubClient {
    async fn organization_accessible(&self, organization: &str) -> Result<bool, PublishError> {
        let membership: Option<OrgMembership> = self
            .http
            .get_optional(&format!("/user/memberships/orgs/{}", encode(organization)))
            .await?;

        Ok(matches!(membership, Some(m) if m.state == "active"))
    }

    async fn create_repository(
        &self,
        spec: &RepositorySpec,
    ) -> Result<RepositoryIdentity, PublishError> {
        self.create("/user/repos", spec).await
    }

    async fn create_repository_in_organization(
        &self,
        organization: &str,
        spec: &RepositorySpec,
    ) -> Result<RepositoryIdentity, PublishError> {
        self.create(&format!("/orgs/{}/repos", encode(organization)), spec)
            .await
    }

    async fn commit_files(
        &self,
        owner: &str,
        name: &str,
        files: &[FileEntry],
        message: &str,
    ) -> Result<CommitResult, PublishError> {
        if files.is_empty() {
            return Err(PublishError::ValidationError(
                "No files to commit".to_string(),
            ));
        }

        let repo = self.repository(owner, name).await?;
        let branch = repo.default_branch;
        let base = format!("{}/git", repository_path(owner, name));

        // Current head of the default branch
        let head: GitRef = self
            .http
            .get(&format!("{}/ref/heads/{}", base, branch_path(&branch)))
            .await?;
        let parent: GitCommit = self
            .http
            .get(&format!("{}/commits/{}", base, head.object.sha))
            .await?;

        // One tree with every file, then one commit on top of the head
        let tree: GitObject = self
            .http
            .post(
                &format!("{}/trees", base),
                &CreateTreeRequest {
                    base_tree: parent.tree.sha,
                    tree: files
                        .iter()
                        .map(|f| TreeEntry::file(&f.path, &f.content))
                        .collect(),
                },
            )
            .await?;
        let commit: GitCommit = self
            .http
            .post(
                &format!("{}/commits", base),
                &CreateCommitRequest {
                    message: message.to_string(),
                    tree: tree.sha,
                    parents: vec![head.object.sha],
                },
            )
            .await?;
        debug!("Created commit {} in {}/{}", commit.sha, owner, name);

        let _: GitRef = self
            .http
            .patch(
                &format!("{}/refs/heads/{}", base, branch_path(&branch)),
                &UpdateRefRequest {
                    sha: commit.sha.clone(),
                    force: false,
                },
            )
            .await?;

        info!(
            "Committed {} files to {}/{}@{}",
            files.len(),
            owner,
            name,
            branch
        );

        Ok(CommitResult {
            sha: commit.sha,
            url: commit.html_url,
            files_committed: files.len(),
        })
    }
}
