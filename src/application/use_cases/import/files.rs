use crate::domain::error::{AppError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

pub const SOURCE_REPO: &str = "ServiceNowDevProgram/code-snippets";
const GITHUB_WEB: &str = "https://github.com/";
const GITHUB_RAW: &str = "https://raw.githubusercontent.com/";

/// Characters left bare by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub content: String,
}

/// Parts of a Service Portal widget, each matched by a well-known file name.
#[derive(Debug, Clone, Default)]
pub struct WidgetFiles {
    pub html: Option<SourceFile>,
    pub css: Option<SourceFile>,
    pub client: Option<SourceFile>,
    pub server: Option<SourceFile>,
}

impl WidgetFiles {
    fn parts(&self) -> [(&'static str, &Option<SourceFile>); 4] {
        [
            ("HTML", &self.html),
            ("CSS", &self.css),
            ("CLIENT", &self.client),
            ("SERVER", &self.server),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.parts().iter().all(|(_, file)| file.is_none())
    }

    pub fn file_names(&self) -> Vec<String> {
        self.parts()
            .iter()
            .filter_map(|(_, file)| file.as_ref().map(|f| f.name.clone()))
            .collect()
    }

    /// Single script body with a `// KIND from file` header per part.
    pub fn compose_script(&self) -> String {
        self.parts()
            .iter()
            .filter_map(|(kind, file)| {
                file.as_ref()
                    .map(|f| format!("// {kind} from {}\n{}", f.name, f.content))
            })
            .collect::<Vec<_>>()
            .join("\n\n---\n\n")
    }
}

const WIDGET_HTML: [&str; 3] = ["HTML Template.html", "html.html", "template.html"];
const WIDGET_CSS: [&str; 4] = ["CSS-SCSS.scss", "css.css", "styles.scss", "style.css"];
const WIDGET_CLIENT: [&str; 3] = ["client controller.js", "client_script.js", "client.js"];
const WIDGET_SERVER: [&str; 3] = ["server script.js", "server_script.js", "server.js"];

/// Where an imported snippet came from in the community repository.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    pub repo: &'static str,
    pub directory: String,
    pub script_files: Vec<String>,
    pub web_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_url: Option<String>,
}

impl SourceInfo {
    /// `directory` is the category folder followed by the snippet folder.
    /// A raw URL is only recorded when the snippet comes from one file.
    pub fn new(directory: &[&str], script_files: Vec<String>) -> Result<Self> {
        let web_url = repo_url(GITHUB_WEB, &["tree", "main"], directory, None)?;
        let raw_url = match script_files.as_slice() {
            [single] => Some(repo_url(GITHUB_RAW, &["main"], directory, Some(single.as_str()))?),
            _ => None,
        };
        Ok(Self {
            repo: SOURCE_REPO,
            directory: directory.join("/"),
            script_files,
            web_url,
            raw_url,
        })
    }
}

fn repo_url(base: &str, prefix: &[&str], directory: &[&str], file: Option<&str>) -> Result<String> {
    let encoded: Vec<String> = directory
        .iter()
        .copied()
        .chain(file)
        .map(|segment| utf8_percent_encode(segment, URI_COMPONENT).to_string())
        .collect();
    let raw = format!("{base}{SOURCE_REPO}/{}/{}", prefix.join("/"), encoded.join("/"));
    let url = Url::parse(&raw).map_err(|e| AppError::Internal(format!("Invalid source URL {raw}: {e}")))?;
    Ok(url.to_string())
}

pub fn has_script_extension(name: &str, extensions: &[&str]) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Immediate subdirectories, sorted by name.
pub async fn list_subdirectories(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    list_entries(dir, true).await
}

/// Regular files in a folder, sorted by name.
pub async fn list_files(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    list_entries(dir, false).await
}

async fn list_entries(dir: &Path, directories: bool) -> Result<Vec<(String, PathBuf)>> {
    let mut reader = tokio::fs::read_dir(dir).await?;
    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        let file_type = entry.file_type().await?;
        let wanted = if directories {
            file_type.is_dir()
        } else {
            file_type.is_file()
        };
        if wanted {
            entries.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
        }
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

pub async fn read_text(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// README content of a snippet folder, matched case-insensitively.
pub async fn read_readme(files: &[(String, PathBuf)]) -> Result<String> {
    match files
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("readme.md"))
    {
        Some((_, path)) => read_text(path).await,
        None => Ok(String::new()),
    }
}

pub async fn read_script_files(files: &[(String, PathBuf)], extensions: &[&str]) -> Result<Vec<SourceFile>> {
    let mut scripts = Vec::new();
    for (name, path) in files {
        if has_script_extension(name, extensions) {
            scripts.push(SourceFile {
                name: name.clone(),
                content: read_text(path).await?,
            });
        }
    }
    Ok(scripts)
}

pub async fn read_widget_files(files: &[(String, PathBuf)]) -> Result<WidgetFiles> {
    Ok(WidgetFiles {
        html: find_widget_part(files, &WIDGET_HTML).await?,
        css: find_widget_part(files, &WIDGET_CSS).await?,
        client: find_widget_part(files, &WIDGET_CLIENT).await?,
        server: find_widget_part(files, &WIDGET_SERVER).await?,
    })
}

async fn find_widget_part(files: &[(String, PathBuf)], candidates: &[&str]) -> Result<Option<SourceFile>> {
    for candidate in candidates {
        if let Some((name, path)) = files
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(candidate))
        {
            let content = read_text(path).await?;
            return Ok(Some(SourceFile {
                name: name.clone(),
                content: content.trim().to_string(),
            }));
        }
    }
    Ok(None)
}

/// Concatenates script files in name order. Headers are only added when
/// there is more than one file.
pub fn combine_scripts(files: &[SourceFile]) -> String {
    let mut sorted: Vec<&SourceFile> = files.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    let with_headers = sorted.len() > 1;

    sorted
        .iter()
        .map(|file| {
            if with_headers {
                format!("// File: {}\n{}", file.name, file.content.trim())
            } else {
                file.content.trim().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, content: &str) -> SourceFile {
        SourceFile {
            name: name.into(),
            content: content.into(),
        }
    }

    #[test]
    fn test_combine_scripts() {
        assert_eq!(combine_scripts(&[]), "");
        assert_eq!(combine_scripts(&[file("a.js", "  one();  \n")]), "one();");
        assert_eq!(
            combine_scripts(&[file("b.js", "two();"), file("a.js", "one();")]),
            "// File: a.js\none();\n\n// File: b.js\ntwo();"
        );
    }

    #[test]
    fn test_widget_compose_script() {
        let widget = WidgetFiles {
            css: Some(file("style.css", ".x {}")),
            html: Some(file("template.html", "<div></div>")),
            ..Default::default()
        };
        assert_eq!(
            widget.compose_script(),
            "// HTML from template.html\n<div></div>\n\n---\n\n// CSS from style.css\n.x {}"
        );
        assert_eq!(widget.file_names(), vec!["template.html", "style.css"]);
        assert!(WidgetFiles::default().is_empty());
    }

    #[test]
    fn test_source_info_encodes_segments() {
        let info = SourceInfo::new(&["Client Scripts", "Hide #field"], vec!["script.js".into()]).unwrap();
        assert_eq!(info.directory, "Client Scripts/Hide #field");
        assert_eq!(
            info.web_url,
            "https://github.com/ServiceNowDevProgram/code-snippets/tree/main/Client%20Scripts/Hide%20%23field"
        );
        assert_eq!(
            info.raw_url.as_deref(),
            Some("https://raw.githubusercontent.com/ServiceNowDevProgram/code-snippets/main/Client%20Scripts/Hide%20%23field/script.js")
        );

        let punctuated = SourceInfo::new(&["UI Actions", "Copy & Paste, v2+"], vec!["run(1).js".into()]).unwrap();
        assert_eq!(
            punctuated.web_url,
            "https://github.com/ServiceNowDevProgram/code-snippets/tree/main/UI%20Actions/Copy%20%26%20Paste%2C%20v2%2B"
        );
        assert_eq!(
            punctuated.raw_url.as_deref(),
            Some("https://raw.githubusercontent.com/ServiceNowDevProgram/code-snippets/main/UI%20Actions/Copy%20%26%20Paste%2C%20v2%2B/run(1).js")
        );

        let multi = SourceInfo::new(&["UI Actions", "Two"], vec!["a.js".into(), "b.js".into()]).unwrap();
        assert!(multi.raw_url.is_none());
        let json = serde_json::to_value(&multi).unwrap();
        assert_eq!(json["scriptFiles"][1], "b.js");
        assert!(json.get("rawUrl").is_none());
    }

    #[test]
    fn test_has_script_extension() {
        assert!(has_script_extension("rule.JS", &["js", "jss"]));
        assert!(!has_script_extension("README.md", &["js"]));
        assert!(!has_script_extension("Makefile", &["js"]));
    }

    #[tokio::test]
    async fn test_reads_folder_contents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("ReadMe.md"), "# Hello").unwrap();
        std::fs::write(dir.path().join("b.ts"), "b();").unwrap();
        std::fs::write(dir.path().join("a.js"), "a();").unwrap();
        std::fs::write(dir.path().join("Server Script.js"), "  data.x = 1;\n").unwrap();

        let files = list_files(dir.path()).await.unwrap();
        let names: Vec<_> = files.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["ReadMe.md", "Server Script.js", "a.js", "b.ts"]);
        assert_eq!(list_subdirectories(dir.path()).await.unwrap().len(), 1);

        assert_eq!(read_readme(&files).await.unwrap(), "# Hello");
        let scripts = read_script_files(&files, &["js", "ts"]).await.unwrap();
        assert_eq!(scripts.len(), 3);

        let widget = read_widget_files(&files).await.unwrap();
        assert_eq!(widget.server.unwrap().content, "data.x = 1;");
        assert!(widget.html.is_none());
    }
}
