//! Normalization of raw export documents into the project aggregate.
//!
//! Each export document contributes one issue (plus its synthesized
//! comments) and extends every project-wide metadata set. Comment order is
//! fixed: source comments first, then attachments, then the aggregate
//! sub-task, parent-task, and issue-link comments.

use crate::error::{JimError, Result};
use crate::jira::RawDocument;
use crate::jira::xml;
use crate::markup;
use crate::model::{Comment, CompositeKey, Issue, IssueBundle, Project};
use chrono::{DateTime, Utc};
use roxmltree::Node;
use std::collections::HashMap;
use tracing::warn;

/// Read-only state shared by every normalization call.
///
/// Built once per run from configuration; no ambient globals.
pub struct NormalizeContext<'a> {
    /// Source identity -> destination login.
    pub username_map: &'a HashMap<String, String>,
    /// Lowercased status names that mean "closed".
    pub terminal_statuses: &'a [String],
    /// Base URL of the source tracker's web UI (attachment links).
    pub source_web_url: &'a str,
    /// Base URL of the destination's web UI (cross-issue links).
    pub dest_web_url: &'a str,
    /// Destination account owning the migrated repositories.
    pub dest_owner: &'a str,
    /// Id of the custom field whose labels become destination labels.
    pub custom_tag_field: &'a str,
}

impl NormalizeContext<'_> {
    /// Explicit map lookup; `None` when no mapping exists.
    #[must_use]
    pub fn resolve(&self, identity: &str) -> Option<&str> {
        self.username_map.get(identity).map(String::as_str)
    }

    /// Render an identity for display: mapped identities become mentions.
    #[must_use]
    pub fn mention(&self, identity: &str) -> String {
        match self.resolve(identity) {
            Some(login) => format!("@{login}"),
            None => identity.to_string(),
        }
    }

    /// True when the status text denotes a terminal (closed) state.
    #[must_use]
    pub fn is_terminal(&self, status: &str) -> bool {
        let status = status.to_lowercase();
        self.terminal_statuses.iter().any(|s| *s == status)
    }

    fn issue_url(&self, key: &CompositeKey) -> String {
        format!(
            "{}/{}/{}/issues/{}",
            self.dest_web_url.trim_end_matches('/'),
            self.dest_owner,
            key.project.to_lowercase(),
            key.ordinal
        )
    }

    fn issue_link(&self, key: &CompositeKey) -> String {
        format!("[{key}]({})", self.issue_url(key))
    }
}

/// Parse one raw document and fold its issues into the aggregate.
///
/// An unavailable document becomes a closed placeholder issue so ordinal
/// continuity is preserved downstream.
///
/// # Errors
///
/// Returns [`JimError::MalformedExport`] when a fetched document contains
/// zero issue records, and validation errors for unparseable keys.
pub fn normalize_document(
    document: &RawDocument,
    project: &mut Project,
    ctx: &NormalizeContext<'_>,
) -> Result<()> {
    match document {
        RawDocument::Unavailable { ordinal } => {
            project.issues.push(IssueBundle {
                issue: Issue::unavailable(&project.name, *ordinal),
                comments: Vec::new(),
            });
            Ok(())
        }
        RawDocument::Fetched { ordinal, xml: text } => {
            let doc = roxmltree::Document::parse(text)?;
            let channel = doc
                .descendants()
                .find(|n| n.has_tag_name("channel"))
                .ok_or_else(|| JimError::MalformedExport {
                    context: format!("{}-{ordinal}", project.name),
                })?;

            let items: Vec<Node<'_, '_>> = xml::children(channel, "item").collect();
            if items.is_empty() {
                return Err(JimError::MalformedExport {
                    context: format!("{}-{ordinal}", project.name),
                });
            }

            for item in items {
                let bundle = normalize_item(item, project, ctx)?;
                project.issues.push(bundle);
            }
            Ok(())
        }
    }
}

fn normalize_item(
    item: Node<'_, '_>,
    project: &mut Project,
    ctx: &NormalizeContext<'_>,
) -> Result<IssueBundle> {
    collect_meta(item, project);

    let key_text = xml::child_text(item, "key")
        .ok_or_else(|| JimError::validation("key", "issue record has no key"))?;
    let key = CompositeKey::parse(&key_text)?;

    let title = xml::child_text(item, "summary").unwrap_or_else(|| key.to_string());

    let mut body = xml::child_text(item, "description")
        .map(|raw| markup::normalize(&raw, &key.project))
        .unwrap_or_default();
    if let Some(environment) = xml::child_text(item, "environment") {
        let environment = markup::normalize(&environment, &key.project);
        if !environment.is_empty() {
            body.push_str("\n#### Environment\n");
            body.push_str(&environment);
        }
    }

    let created_at = date_from(item, "created");
    let closed_at = date_from(item, "resolved");

    let closed = xml::child_text(item, "status")
        .is_some_and(|status| ctx.is_terminal(&status));

    let fix_version = xml::child_text(item, "fixVersion");
    let resolution = xml::child_text(item, "resolution");

    let mut labels = Vec::new();
    xml::append_values(item, "type", &mut labels, "Type: ");
    xml::append_values(item, "priority", &mut labels, "Priority: ");
    xml::append_values(item, "component", &mut labels, "Component: ");
    if let Some(explicit) = xml::child(item, "labels") {
        xml::append_values(explicit, "label", &mut labels, "");
    }
    if let Some(fields) = xml::child(item, "customfields") {
        if let Some(tags) =
            xml::child_with_attribute(fields, "customfield", "id", ctx.custom_tag_field)
        {
            if let Some(values) = xml::child(tags, "customfieldvalues") {
                xml::append_values(values, "label", &mut labels, "");
            }
        }
    }

    let assignee = identity_from(item, "assignee", ctx);
    let reporter = identity_from(item, "reporter", ctx);

    let issue = Issue {
        key: key.clone(),
        title,
        body,
        created_at,
        closed_at,
        closed,
        resolution,
        assignee,
        reporter,
        fix_version,
        labels,
        milestone: None,
    };

    let mut comments = source_comments(item, &key, ctx);
    comments.extend(attachment_comments(item, ctx));
    comments.extend(subtask_comment(item, created_at, ctx));
    comments.extend(parent_comment(item, created_at, ctx));
    comments.extend(link_comment(item, created_at, ctx));

    Ok(IssueBundle { issue, comments })
}

fn collect_meta(item: Node<'_, '_>, project: &mut Project) {
    let meta = &mut project.meta;
    xml::collect_values(item, "project", &mut meta.projects);
    xml::collect_values(item, "version", &mut meta.versions);
    xml::collect_values(item, "fixVersion", &mut meta.versions);
    xml::collect_values(item, "component", &mut meta.components);
    xml::collect_values(item, "assignee", &mut meta.assignees);
    xml::collect_values(item, "reporter", &mut meta.assignees);
    xml::collect_values(item, "type", &mut meta.types);
    xml::collect_values(item, "status", &mut meta.statuses);
    xml::collect_values(item, "resolution", &mut meta.resolutions);
    xml::collect_values(item, "priority", &mut meta.priorities);
    meta.prune_sentinels();
}

/// Resolve an identity element through the username map.
///
/// The literal "Unassigned" (and the legacy "-1" marker) means no identity.
fn identity_from(
    item: Node<'_, '_>,
    name: &str,
    ctx: &NormalizeContext<'_>,
) -> Option<String> {
    let element = xml::child(item, name)?;
    let raw = element
        .attribute("username")
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .or_else(|| element.text().map(str::trim))?;
    if raw.is_empty() || raw == "Unassigned" || raw == "-1" {
        return None;
    }
    Some(ctx.resolve(raw).unwrap_or(raw).to_string())
}

fn source_comments(
    item: Node<'_, '_>,
    key: &CompositeKey,
    ctx: &NormalizeContext<'_>,
) -> Vec<Comment> {
    let Some(container) = xml::child(item, "comments") else {
        return Vec::new();
    };

    xml::children(container, "comment")
        .filter_map(|node| {
            let raw_body = node.text()?;
            let author = node.attribute("author").unwrap_or("unknown");
            let created = node.attribute("created").and_then(parse_export_date);
            let body = markup::normalize(raw_body, &key.project);
            Some(Comment {
                created_at: created,
                body: format!("{} said:\n{body}", ctx.mention(author)),
                author: ctx.resolve(author).map(ToString::to_string),
            })
        })
        .collect()
}

fn attachment_comments(item: Node<'_, '_>, ctx: &NormalizeContext<'_>) -> Vec<Comment> {
    let Some(container) = xml::child(item, "attachments") else {
        return Vec::new();
    };

    xml::children(container, "attachment")
        .filter_map(|node| {
            let id = node.attribute("id")?;
            let name = node.attribute("name")?;
            let author = node.attribute("author").unwrap_or("unknown");
            let created = node.attribute("created").and_then(parse_export_date);
            let url = format!(
                "{}/secure/attachment/{id}/{name}",
                ctx.source_web_url.trim_end_matches('/')
            );
            Some(Comment {
                created_at: created,
                body: format!(
                    "File: [{name}]({url})\nAttached By: {}\n",
                    ctx.mention(author)
                ),
                author: ctx.resolve(author).map(ToString::to_string),
            })
        })
        .collect()
}

fn subtask_comment(
    item: Node<'_, '_>,
    created_at: Option<DateTime<Utc>>,
    ctx: &NormalizeContext<'_>,
) -> Option<Comment> {
    let container = xml::child(item, "subtasks")?;
    let keys = linked_keys(xml::children(container, "subtask"));
    if keys.is_empty() {
        return None;
    }

    let mut body = String::from("Sub-Tasks:\n");
    for key in keys {
        body.push_str(&ctx.issue_link(&key));
        body.push('\n');
    }
    Some(Comment::new(created_at, body))
}

fn parent_comment(
    item: Node<'_, '_>,
    created_at: Option<DateTime<Utc>>,
    ctx: &NormalizeContext<'_>,
) -> Option<Comment> {
    let text = xml::child_text(item, "parent")?;
    let key = match CompositeKey::parse(&text) {
        Ok(key) => key,
        Err(err) => {
            warn!(parent = %text, %err, "skipping unparseable parent link");
            return None;
        }
    };
    Some(Comment::new(
        created_at,
        format!("Parent-Task: {}\n", ctx.issue_link(&key)),
    ))
}

fn link_comment(
    item: Node<'_, '_>,
    created_at: Option<DateTime<Utc>>,
    ctx: &NormalizeContext<'_>,
) -> Option<Comment> {
    let container = xml::child(item, "issuelinks")?;
    let link_types: Vec<Node<'_, '_>> = xml::children(container, "issuelinktype").collect();
    if link_types.is_empty() {
        return None;
    }

    let mut body = String::from("Issue-Links:\n");
    for link_type in link_types {
        for direction in ["outwardlinks", "inwardlinks"] {
            let Some(links) = xml::child(link_type, direction) else {
                continue;
            };
            if let Some(description) = links.attribute("description") {
                body.push_str(description);
                body.push('\n');
            }
            let keys = linked_keys(
                xml::children(links, "issuelink")
                    .filter_map(|link| xml::child(link, "issuekey")),
            );
            for key in keys {
                body.push_str(&ctx.issue_link(&key));
                body.push('\n');
            }
        }
    }
    Some(Comment::new(created_at, body))
}

fn linked_keys<'a, 'input: 'a>(nodes: impl Iterator<Item = Node<'a, 'input>>) -> Vec<CompositeKey> {
    nodes
        .filter_map(|node| {
            let text = node.text()?.trim();
            match CompositeKey::parse(text) {
                Ok(key) => Some(key),
                Err(err) => {
                    warn!(key = text, %err, "skipping unparseable issue link");
                    None
                }
            }
        })
        .collect()
}

fn date_from(item: Node<'_, '_>, name: &str) -> Option<DateTime<Utc>> {
    xml::child_text(item, name).and_then(|text| parse_export_date(&text))
}

/// Parse the export's RFC 2822-style timestamps.
fn parse_export_date(text: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc2822(text.trim()) {
        Ok(parsed) => Some(parsed.with_timezone(&Utc)),
        Err(err) => {
            warn!(date = text, %err, "unparseable export date");
            None
        }
    }
}
