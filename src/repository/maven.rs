//! Remote Maven-layout repository.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use quick_xml::Reader;
use quick_xml::events::Event;

use super::{ArtifactLocation, Repository, RepositoryKind, ResolvedArtifact};
use crate::http::{HttpClient, is_not_found};
use crate::reference::DependencyReference;

/// A remote index laid out as `<base>/<group path>/<artifact>/<version>/`.
pub struct MavenRepository {
    http_client: HttpClient,
    base_url: String,
    name: String,
}

impl MavenRepository {
    /// `name` is what error messages and listings show (`google`, a URL, ...).
    pub fn new(http_client: HttpClient, name: impl Into<String>, base_url: &str) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            name: name.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn version_dir(&self, group: &str, artifact: &str, version: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_url,
            group.replace('.', "/"),
            artifact,
            version
        )
    }
}

#[async_trait]
impl Repository for MavenRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> RepositoryKind {
        RepositoryKind::Maven
    }

    #[tracing::instrument(skip(self), fields(repository = %self.name))]
    async fn locate(&self, reference: &DependencyReference) -> Result<Option<ResolvedArtifact>> {
        let DependencyReference::Coordinate {
            group,
            artifact,
            version,
        } = reference
        else {
            return Ok(None);
        };

        let dir = self.version_dir(group, artifact, version);
        let pom_url = format!("{}/{}-{}.pom", dir, artifact, version);

        let pom = match self.http_client.get_text(&pom_url).await {
            Ok(pom) => pom,
            Err(e) if is_not_found(&e) => {
                debug!("{} not listed in {}", reference, self.name);
                return Ok(None);
            }
            Err(e) => return Err(e.context(format!("Failed to probe {}", pom_url))),
        };

        let packaging = extract_packaging(&pom)
            .with_context(|| format!("Failed to read packaging from {}", pom_url))?;
        let extension = packaging_extension(packaging.as_deref());
        debug!("{} found in {} as {}", reference, self.name, extension);

        Ok(Some(ResolvedArtifact {
            reference: reference.clone(),
            repository: self.name.clone(),
            location: ArtifactLocation::Remote(format!(
                "{}/{}-{}.{}",
                dir, artifact, version, extension
            )),
            extension,
        }))
    }
}

/// Returns the text of the `<packaging>` element directly under the POM root.
///
/// Elements of the same name deeper in the document (plugin configuration and
/// the like) are ignored.
pub fn extract_packaging(pom: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(pom);
    let mut depth = 0usize;
    let mut in_packaging = false;
    let mut value = String::new();

    loop {
        match reader.read_event().context("Malformed POM")? {
            Event::Start(e) => {
                depth += 1;
                in_packaging = depth == 2 && e.local_name().as_ref() == b"packaging";
            }
            Event::End(_) => {
                if in_packaging {
                    break;
                }
                depth = depth.saturating_sub(1);
            }
            Event::Text(e) if in_packaging => {
                value.push_str(&e.unescape().context("Malformed POM text")?)
            }
            Event::CData(e) if in_packaging => {
                value.push_str(&String::from_utf8_lossy(e.as_ref()))
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let value = value.trim();
    Ok((!value.is_empty()).then(|| value.to_string()))
}

/// Maps POM packaging to the file extension of the main artifact.
pub fn packaging_extension(packaging: Option<&str>) -> String {
    match packaging {
        None | Some("jar") | Some("bundle") => "jar".to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Client;

    const AAR_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project>
  <modelVersion>4.0.0</modelVersion>
  <groupId>co.epsilondelta</groupId>
  <artifactId>orion-flutter</artifactId>
  <version>1.0.0</version>
  <packaging>aar</packaging>
</project>"#;

    fn orion() -> DependencyReference {
        DependencyReference::coordinate("co.epsilondelta", "orion-flutter", "1.0.0")
    }

    fn packaging(pom: &str) -> Option<String> {
        extract_packaging(pom).unwrap()
    }

    #[test]
    fn test_extract_packaging() {
        assert_eq!(packaging(AAR_POM).as_deref(), Some("aar"));
        assert_eq!(packaging("<project></project>"), None);
        assert_eq!(
            packaging("<project><packaging> jar </packaging></project>").as_deref(),
            Some("jar")
        );
        assert_eq!(
            packaging("<project><!-- <packaging>aar</packaging> --></project>"),
            None
        );
        assert_eq!(packaging("<project><packaging></packaging></project>"), None);
        assert_eq!(
            packaging("<project><packaging >aar</packaging ></project>").as_deref(),
            Some("aar")
        );
    }

    #[test]
    fn test_nested_packaging_is_ignored() {
        let pom = r#"<project>
  <artifactId>orion-flutter</artifactId>
  <build>
    <plugins>
      <plugin>
        <configuration><packaging>pom</packaging></configuration>
      </plugin>
    </plugins>
  </build>
</project>"#;
        assert_eq!(packaging(pom), None);
        assert_eq!(packaging_extension(packaging(pom).as_deref()), "jar");

        let both = r#"<project>
  <build><plugins><plugin><configuration><packaging>pom</packaging></configuration></plugin></plugins></build>
  <packaging>aar</packaging>
</project>"#;
        assert_eq!(packaging(both).as_deref(), Some("aar"));
    }

    #[test]
    fn test_packaging_text_is_decoded() {
        assert_eq!(
            packaging("<project><packaging><![CDATA[aar]]></packaging></project>").as_deref(),
            Some("aar")
        );
        assert_eq!(
            packaging(
                r#"<project xmlns="http://maven.apache.org/POM/4.0.0"><packaging>a&#97;r</packaging></project>"#
            )
            .as_deref(),
            Some("aar")
        );
    }

    #[test]
    fn test_malformed_pom_is_an_error() {
        assert!(extract_packaging("<project><packaging>aar</project>").is_err());
    }

    #[test]
    fn test_packaging_extension() {
        assert_eq!(packaging_extension(None), "jar");
        assert_eq!(packaging_extension(Some("jar")), "jar");
        assert_eq!(packaging_extension(Some("bundle")), "jar");
        assert_eq!(packaging_extension(Some("aar")), "aar");
        assert_eq!(packaging_extension(Some("klib")), "klib");
    }

    #[tokio::test]
    async fn test_locate_listed_coordinate() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock(
                "GET",
                "/co/epsilondelta/orion-flutter/1.0.0/orion-flutter-1.0.0.pom",
            )
            .with_status(200)
            .with_body(AAR_POM)
            .create_async()
            .await;

        let repo = MavenRepository::new(HttpClient::new(Client::new()), "test", &server.url());
        let artifact = repo.locate(&orion()).await.unwrap().unwrap();

        mock.assert_async().await;
        assert_eq!(artifact.extension, "aar");
        assert_eq!(artifact.repository, "test");
        assert_eq!(
            artifact.location,
            ArtifactLocation::Remote(format!(
                "{}/co/epsilondelta/orion-flutter/1.0.0/orion-flutter-1.0.0.aar",
                server.url()
            ))
        );
    }

    #[tokio::test]
    async fn test_locate_unlisted_coordinate() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock(
                "GET",
                "/co/epsilondelta/orion-flutter/1.0.0/orion-flutter-1.0.0.pom",
            )
            .with_status(404)
            .create_async()
            .await;

        let repo = MavenRepository::new(HttpClient::new(Client::new()), "test", &server.url());
        let found = repo.locate(&orion()).await.unwrap();

        mock.assert_async().await;
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_locate_broken_repository_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock(
                "GET",
                "/co/epsilondelta/orion-flutter/1.0.0/orion-flutter-1.0.0.pom",
            )
            .with_status(503)
            .create_async()
            .await;

        let repo = MavenRepository::new(HttpClient::new(Client::new()), "test", &server.url());
        let err = repo.locate(&orion()).await.unwrap_err();

        assert!(format!("{:#}", err).contains("Failed to probe"));
    }

    #[tokio::test]
    async fn test_named_reference_is_never_requested() {
        // Unreachable base URL: any request would fail the test
        let repo = MavenRepository::new(
            HttpClient::new(Client::new()),
            "test",
            "http://127.0.0.1:9",
        );
        let found = repo
            .locate(&DependencyReference::named("orion_flutter-release", "aar"))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let repo = MavenRepository::new(
            HttpClient::new(Client::new()),
            "test",
            "https://repo.example.com/maven2/",
        );
        assert_eq!(repo.base_url(), "https://repo.example.com/maven2");
        assert_eq!(
            repo.version_dir("co.epsilondelta", "orion-flutter", "1.0.0"),
            "https://repo.example.com/maven2/co/epsilondelta/orion-flutter/1.0.0"
        );
    }
}
