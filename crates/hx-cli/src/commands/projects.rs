//! Project listing and lookup commands.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use hx_api::{ActiveFilter, Harvest, Transport};
use hx_core::{ClientId, Project, ProjectId};
use serde_json::Value;

use crate::OutputFormat;
use crate::print::{project_line, write_json, write_lines};

#[derive(Debug, Args)]
pub struct ProjectsArgs {
    /// Output format.
    #[arg(short, long, value_enum, default_value_t)]
    pub format: OutputFormat,

    /// Filter by status.
    #[arg(short, long, value_enum, default_value_t)]
    pub active: ActiveFilter,

    /// Filter by client identifier.
    #[arg(long)]
    pub client: Option<ClientId>,
}

#[derive(Debug, Args)]
pub struct ProjectArgs {
    /// Identifier of the project.
    #[arg(short, long)]
    pub project_id: ProjectId,
}

pub async fn list<W: Write, T: Transport>(
    writer: &mut W,
    harvest: &Harvest<T>,
    args: &ProjectsArgs,
) -> Result<()> {
    match args.format {
        OutputFormat::Text => {
            let projects: Vec<Project> = harvest
                .projects(args.active, args.client)
                .await
                .context("failed to list projects")?;
            writeln!(writer, "List of current projects in Harvest:")?;
            writeln!(writer)?;
            write_lines(writer, &projects, project_line)
        }
        OutputFormat::Json => {
            let projects: Vec<Value> = harvest
                .projects(args.active, args.client)
                .await
                .context("failed to list projects")?;
            write_json(writer, &projects)
        }
    }
}

pub async fn show<W: Write, T: Transport>(
    writer: &mut W,
    harvest: &Harvest<T>,
    args: &ProjectArgs,
) -> Result<()> {
    let project: Value = harvest
        .project(args.project_id)
        .await
        .with_context(|| format!("failed to fetch project {}", args.project_id))?;
    write_json(writer, &project)
}

#[cfg(test)]
mod tests {
    use hx_api::Method;
    use hx_api::testing::MockTransport;
    use insta::assert_snapshot;
    use serde_json::json;

    use super::*;

    fn projects_page() -> serde_json::Value {
        json!({
            "projects": [
                {
                    "id": 14_308_069,
                    "name": "Online Store - Phase 1",
                    "code": "OS1",
                    "is_active": true,
                    "client": {"id": 5_735_776, "name": "123 Industries"}
                },
                {
                    "id": 14_307_913,
                    "name": "Marketing Website",
                    "is_active": false,
                    "client": {"id": 5_735_776, "name": "123 Industries"}
                }
            ],
            "total_pages": 1,
            "total_entries": 2
        })
    }

    #[tokio::test]
    async fn lists_projects_for_client() {
        let harvest = Harvest::new(MockTransport::new().respond_page("/projects", 1, projects_page()));
        let args = ProjectsArgs {
            format: OutputFormat::Text,
            active: ActiveFilter::All,
            client: Some(ClientId::new(5_735_776).unwrap()),
        };

        let mut output = Vec::new();
        list(&mut output, &harvest, &args).await.unwrap();

        let request = &harvest.transport().requests()[0];
        assert_eq!(request.params["client_id"], "5735776");
        assert!(!request.params.contains_key("is_active"));
        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        List of current projects in Harvest:

        [14308069] [123 Industries      ] Online Store - Phase 1
        [14307913] [123 Industries      ] Marketing Website [inactive]
        ");
    }

    #[tokio::test]
    async fn show_prints_payload_unchanged() {
        let harvest = Harvest::new(MockTransport::new().respond(
            Method::Get,
            "/projects/14308069",
            json!({
                "id": 14_308_069,
                "name": "Online Store - Phase 1",
                "is_billable": true,
                "budget": null
            }),
        ));
        let args = ProjectArgs {
            project_id: ProjectId::new(14_308_069).unwrap(),
        };

        let mut output = Vec::new();
        show(&mut output, &harvest, &args).await.unwrap();

        assert_snapshot!(String::from_utf8(output).unwrap(), @r#"
        {
          "id": 14308069,
          "name": "Online Store - Phase 1",
          "is_billable": true,
          "budget": null
        }
        "#);
    }

    #[tokio::test]
    async fn show_fails_with_project_context() {
        let harvest = Harvest::new(MockTransport::new().fail(
            Method::Get,
            "/projects/99",
            404,
            r#"{"status":404,"error":"Not Found"}"#,
        ));
        let args = ProjectArgs {
            project_id: ProjectId::new(99).unwrap(),
        };

        let mut output = Vec::new();
        let err = show(&mut output, &harvest, &args).await.unwrap_err();

        assert_eq!(err.to_string(), "failed to fetch project 99");
        assert!(format!("{err:#}").contains("Not Found"));
    }
}
