use anyhow::Result;
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::apply::{apply_bookmarks, ApplyOptions, PageOffset};
use crate::bookmark_file::parse_bookmark_file;
use crate::extract::extract_pages;
use crate::interact::Preset;
use crate::pdf::outline::{read_outline, OutlineListing};
use crate::pdf::save::SaveOutcome;
use crate::pdf::PdfDocument;
use crate::templates::{AI_PROMPT, BOOKMARK_TEMPLATE};

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PathRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfApplyBookmarksRequest {
    #[schemars(description = "Path to the PDF file to update")]
    pub path: String,
    #[schemars(description = "Path to the bookmark TXT file")]
    pub bookmarks: String,
    #[schemars(description = "Document page on which bookmark page 1 lands (default: 1, no shift)")]
    #[serde(default = "default_offset")]
    pub offset: i64,
    #[schemars(
        description = "Apply the remaining bookmarks when some point outside the document (default: false)"
    )]
    #[serde(default)]
    pub allow_partial: bool,
    #[schemars(description = "Where to save if the original file cannot be replaced")]
    pub fallback_output: Option<String>,
}

fn default_offset() -> i64 {
    1
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfExtractRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Page ranges (e.g., '1-5,8,10-12')")]
    pub pages: String,
    #[schemars(description = "Output file path (default: <name>_<pages>.pdf next to the source)")]
    pub output: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PdfServer {
    tool_router: ToolRouter<Self>,
}

impl PdfServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }
}

impl Default for PdfServer {
    fn default() -> Self {
        Self::new()
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("Error: {}", e))
}

#[tool_router]
impl PdfServer {
    #[tool(description = "Get PDF metadata including title, author, subject, keywords, dates, version and page count")]
    fn pdf_info(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        match PdfDocument::open(&path) {
            Ok(doc) => {
                let info = doc.get_info();
                to_json(&PdfInfoResult {
                    path,
                    page_count: info.page_count,
                    version: info.version,
                    title: info.title,
                    author: info.author,
                    creator: info.creator,
                    producer: info.producer,
                    subject: info.subject,
                    keywords: info.keywords,
                    creation_date: info.creation_date,
                    mod_date: info.mod_date,
                    encrypted: info.encrypted,
                })
            }
            Err(e) => format!("Error: {:#}", e),
        }
    }

    #[tool(description = "List the bookmarks (outline) of a PDF as level/title/page entries")]
    fn pdf_bookmarks(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        let doc = match PdfDocument::open(&path) {
            Ok(d) => d,
            Err(e) => return format!("Error: {:#}", e),
        };
        let result = match read_outline(&doc.doc) {
            OutlineListing::Missing => BookmarksResult {
                has_bookmarks: false,
                entries: Vec::new(),
            },
            OutlineListing::Entries(entries) => BookmarksResult {
                has_bookmarks: true,
                entries: entries
                    .into_iter()
                    .map(|e| BookmarkResult {
                        level: e.level,
                        title: e.title,
                        page: e.page,
                    })
                    .collect(),
            },
        };
        to_json(&result)
    }

    #[tool(description = "Apply a bookmark TXT file (lines like 'level|title|page') as the outline of a PDF")]
    fn pdf_apply_bookmarks(&self, Parameters(req): Parameters<PdfApplyBookmarksRequest>) -> String {
        let entries = match parse_bookmark_file(&req.bookmarks) {
            Ok(entries) => entries,
            Err(e) => return format!("Error: {}", e),
        };
        let options = ApplyOptions {
            offset: PageOffset::from_entered(req.offset),
        };
        let mut preset = Preset {
            allow_partial: req.allow_partial,
            destination: req.fallback_output.map(PathBuf::from),
        };

        match apply_bookmarks(Path::new(&req.path), &entries, &options, &mut preset) {
            Ok(report) => {
                let saved_to = match &report.outcome {
                    SaveOutcome::InPlace | SaveOutcome::Replaced => req.path,
                    SaveOutcome::Relocated(dest) => dest.display().to_string(),
                };
                to_json(&ApplyResult {
                    applied: report.applied,
                    skipped: report
                        .skipped
                        .into_iter()
                        .map(|s| SkippedResult {
                            row: s.row,
                            title: s.title,
                            page: s.page,
                        })
                        .collect(),
                    saved_to,
                })
            }
            Err(e) => format!("Error: {}", e),
        }
    }

    #[tool(description = "Extract specific pages from a PDF and save them to a new file")]
    fn pdf_extract(&self, Parameters(req): Parameters<PdfExtractRequest>) -> String {
        let output = req.output.map(PathBuf::from);
        match extract_pages(Path::new(&req.path), &req.pages, output.as_deref()) {
            Ok(report) => to_json(&ExtractResult {
                output_path: report.output.display().to_string(),
                pages: report.pages,
            }),
            Err(e) => format!("Error: {:#}", e),
        }
    }

    #[tool(description = "Get a prompt that asks an AI assistant to write a bookmark file for a PDF")]
    fn bookmark_prompt(&self) -> String {
        AI_PROMPT.to_string()
    }

    #[tool(description = "Get a bookmark file template showing the supported line formats")]
    fn bookmark_template(&self) -> String {
        BOOKMARK_TEMPLATE.to_string()
    }
}

// Result types for MCP tools

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PdfInfoResult {
    pub path: String,
    pub page_count: u32,
    pub version: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creation_date: Option<String>,
    pub mod_date: Option<String>,
    pub encrypted: bool,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct BookmarkResult {
    pub level: u32,
    pub title: String,
    pub page: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct BookmarksResult {
    pub has_bookmarks: bool,
    pub entries: Vec<BookmarkResult>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SkippedResult {
    pub row: usize,
    pub title: String,
    pub page: i64,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ApplyResult {
    pub applied: usize,
    pub skipped: Vec<SkippedResult>,
    pub saved_to: String,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ExtractResult {
    pub output_path: String,
    pub pages: Vec<u32>,
}

#[tool_handler]
impl ServerHandler for PdfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "PDF bookmark tools. Use pdf_info for document metadata, pdf_bookmarks to list \
                 the outline, bookmark_prompt or bookmark_template to learn the bookmark file \
                 format, pdf_apply_bookmarks to write a bookmark file into a PDF, and \
                 pdf_extract to copy page ranges into a new PDF."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server() -> Result<()> {
    let server = PdfServer::new();

    // Serve using stdin/stdout as a tuple
    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}
