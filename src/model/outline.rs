use super::{CompileRequest, ModelCompiler, ModelKind};
use crate::connection::ConnectionMap;
use crate::error::PublisherError;
use async_trait::async_trait;
use publisher_schema::{CellType, CompiledModel, NotebookCell, Query, Source, View};
use std::path::Path;
use tracing::debug;

const MARKDOWN_CELL_MARKER: &str = ">>>markdown";
const CODE_CELL_MARKER: &str = ">>>malloy";

/// Structural compiler: extracts declarations and annotations without evaluating queries.
///
/// It rejects what would never compile: references to undefined connections, missing
/// imports and unbalanced delimiters. Full semantic checking belongs to the query engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutlineCompiler;

#[async_trait]
impl ModelCompiler for OutlineCompiler {
    async fn compile(&self, request: CompileRequest<'_>) -> Result<CompiledModel, PublisherError> {
        let full_path = request.package_root.join(request.path);
        let text = tokio::fs::read_to_string(&full_path)
            .await
            .map_err(|e| compile_error(request.path, e.to_string()))?;

        let mut outliner = Outliner::new(request.connections);
        let notebook_cells = match request.kind {
            ModelKind::Source => {
                outliner
                    .feed(&text, 1)
                    .map_err(|msg| compile_error(request.path, msg))?;
                Vec::new()
            }
            ModelKind::Notebook => outline_notebook(&mut outliner, &text)
                .map_err(|msg| compile_error(request.path, msg))?,
        };
        let outline = outliner.finish();

        let model_dir = Path::new(request.path)
            .parent()
            .unwrap_or_else(|| Path::new(""));
        for import in &outline.imports {
            let target = request.package_root.join(model_dir).join(import);
            if !tokio::fs::try_exists(&target).await.unwrap_or(false) {
                return Err(compile_error(
                    request.path,
                    format!("import '{import}' not found"),
                ));
            }
        }

        debug!(
            package = request.package_name,
            path = request.path,
            sources = outline.sources.len(),
            queries = outline.queries.len(),
            cells = notebook_cells.len(),
            "Model outlined"
        );

        Ok(CompiledModel {
            package_name: request.package_name.to_string(),
            path: request.path.to_string(),
            r#type: request.kind.as_wire(),
            sources: outline.sources,
            queries: outline.queries,
            notebook_cells,
        })
    }
}

fn compile_error(path: &str, message: impl Into<String>) -> PublisherError {
    PublisherError::Compile {
        path: path.to_string(),
        message: message.into(),
    }
}

#[derive(Debug, Default)]
struct Outline {
    sources: Vec<Source>,
    queries: Vec<Query>,
    imports: Vec<String>,
}

struct Outliner<'a> {
    connections: &'a ConnectionMap,
    outline: Outline,
    /// Annotation lines waiting for the next declaration.
    pending: Vec<String>,
    current_source: Option<usize>,
}

impl<'a> Outliner<'a> {
    fn new(connections: &'a ConnectionMap) -> Self {
        Self {
            connections,
            outline: Outline::default(),
            pending: Vec::new(),
            current_source: None,
        }
    }

    /// Outlines one chunk of model text. `first_line` numbers diagnostics.
    fn feed(&mut self, text: &str, first_line: usize) -> Result<(), String> {
        check_balanced(text, first_line)?;

        for (offset, raw) in text.lines().enumerate() {
            let line_no = first_line + offset;
            let line = raw.trim();

            if line.is_empty()
                || line.starts_with("//")
                || line.starts_with("--")
                || line.starts_with("##")
            {
                continue;
            }

            if line.starts_with('#') {
                self.pending.push(line.to_string());
                continue;
            }

            if let Some(rest) = line.strip_prefix("import ") {
                let target = quoted(rest).ok_or_else(|| {
                    format!("line {line_no}: expected a quoted path after 'import'")
                })?;
                self.outline.imports.push(target.to_string());
                continue;
            }

            if let Some(rest) = line.strip_prefix("source:") {
                let (name, body) = declaration(rest)
                    .ok_or_else(|| format!("line {line_no}: expected a name after 'source:'"))?;
                self.check_connections(body, line_no)?;
                let annotations = std::mem::take(&mut self.pending);
                self.outline.sources.push(Source {
                    name: name.to_string(),
                    annotations,
                    views: Vec::new(),
                });
                self.current_source = Some(self.outline.sources.len() - 1);
                continue;
            }

            if let Some(rest) = line.strip_prefix("view:") {
                let (name, _) = declaration(rest)
                    .ok_or_else(|| format!("line {line_no}: expected a name after 'view:'"))?;
                let annotations = std::mem::take(&mut self.pending);
                let Some(source) = self
                    .current_source
                    .and_then(|idx| self.outline.sources.get_mut(idx))
                else {
                    return Err(format!(
                        "line {line_no}: view {name} declared outside of a source"
                    ));
                };
                source.views.push(View {
                    name: name.to_string(),
                    annotations,
                });
                continue;
            }

            if let Some(rest) = line.strip_prefix("query:") {
                let (name, body) = declaration(rest)
                    .ok_or_else(|| format!("line {line_no}: expected a name after 'query:'"))?;
                self.check_connections(body, line_no)?;
                let annotations = std::mem::take(&mut self.pending);
                self.outline.queries.push(Query {
                    name: name.to_string(),
                    annotations,
                });
                self.current_source = None;
                continue;
            }

            if line.starts_with("run:") {
                self.pending.clear();
                self.current_source = None;
            }
        }
        Ok(())
    }

    fn check_connections(&self, body: &str, line_no: usize) -> Result<(), String> {
        match referenced_connections(body)
            .into_iter()
            .find(|name| !self.connections.contains_key(*name))
        {
            Some(name) => Err(format!(
                "line {line_no}: connection '{name}' is not defined"
            )),
            None => Ok(()),
        }
    }

    fn query_count(&self) -> usize {
        self.outline.queries.len()
    }

    fn first_query_since(&self, count: usize) -> Option<String> {
        self.outline.queries.get(count).map(|q| q.name.clone())
    }

    fn finish(self) -> Outline {
        self.outline
    }
}

fn outline_notebook(outliner: &mut Outliner<'_>, text: &str) -> Result<Vec<NotebookCell>, String> {
    let mut cells = Vec::new();
    let mut current: Option<PendingCell<'_>> = None;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let marker = line.trim_end();
        let next_kind = if marker.starts_with(MARKDOWN_CELL_MARKER) {
            Some(CellType::Markdown)
        } else if marker.starts_with(CODE_CELL_MARKER) {
            Some(CellType::Code)
        } else {
            None
        };

        if let Some(kind) = next_kind {
            if let Some(cell) = current.take() {
                cells.push(cell.finish(outliner)?);
            }
            current = Some(PendingCell {
                kind,
                first_line: line_no + 1,
                lines: Vec::new(),
            });
            continue;
        }

        match current.as_mut() {
            Some(cell) => cell.lines.push(line),
            // Text before the first marker is treated as markdown.
            None if !line.trim().is_empty() => {
                current = Some(PendingCell {
                    kind: CellType::Markdown,
                    first_line: line_no,
                    lines: vec![line],
                });
            }
            None => {}
        }
    }

    if let Some(cell) = current.take() {
        cells.push(cell.finish(outliner)?);
    }
    Ok(cells)
}

struct PendingCell<'t> {
    kind: CellType,
    first_line: usize,
    lines: Vec<&'t str>,
}

impl PendingCell<'_> {
    fn finish(self, outliner: &mut Outliner<'_>) -> Result<NotebookCell, String> {
        let joined = self.lines.join("\n");
        let query_name = match self.kind {
            CellType::Code => {
                let before = outliner.query_count();
                outliner.feed(&joined, self.first_line)?;
                outliner.first_query_since(before)
            }
            CellType::Markdown => None,
        };
        Ok(NotebookCell {
            r#type: self.kind,
            text: joined.trim().to_string(),
            query_name,
        })
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Splits `name is body` (the part after `source:`/`query:`/`view:`).
fn declaration(rest: &str) -> Option<(&str, &str)> {
    let rest = rest.trim_start();
    let end = rest
        .char_indices()
        .find(|(_, c)| !is_ident_char(*c))
        .map_or(rest.len(), |(i, _)| i);
    if end == 0 {
        return None;
    }
    let (name, tail) = rest.split_at(end);
    let tail = tail.trim_start();
    let body = tail.strip_prefix("is").unwrap_or(tail);
    Some((name, body))
}

/// Connection names used as `<name>.table(` or `<name>.sql(`.
fn referenced_connections(body: &str) -> Vec<&str> {
    let mut names = Vec::new();
    for marker in [".table(", ".sql("] {
        for (pos, _) in body.match_indices(marker) {
            let prefix = &body[..pos];
            let start = prefix
                .char_indices()
                .rev()
                .find(|(_, c)| !is_ident_char(*c))
                .map_or(0, |(i, c)| i + c.len_utf8());
            let name = &prefix[start..];
            if !name.is_empty() {
                names.push(name);
            }
        }
    }
    names
}

/// First `"..."` or `'...'` literal in `text`.
fn quoted(text: &str) -> Option<&str> {
    let text = text.trim_start();
    let quote = text.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let inner = &text[1..];
    inner.find(quote).map(|end| &inner[..end])
}

fn closing_for(open: u8) -> u8 {
    match open {
        b'{' => b'}',
        b'(' => b')',
        _ => b']',
    }
}

/// Verifies `{}`/`()`/`[]` nesting outside strings, comments and annotation lines.
fn check_balanced(text: &str, first_line: usize) -> Result<(), String> {
    let bytes = text.as_bytes();
    let mut stack: Vec<(u8, usize)> = Vec::new();
    let mut line = first_line;
    let mut quote: Option<&[u8]> = None;
    let mut at_line_start = true;
    let mut i = 0;

    let skip_to_newline = |mut i: usize| {
        while i < bytes.len() && bytes[i] != b'\n' {
            i += 1;
        }
        i
    };

    while i < bytes.len() {
        let b = bytes[i];

        if let Some(delim) = quote {
            if b == b'\n' {
                line += 1;
            }
            if b == b'\\' && delim.len() == 1 {
                if bytes.get(i + 1) == Some(&b'\n') {
                    line += 1;
                }
                i += 2;
                continue;
            }
            if bytes[i..].starts_with(delim) {
                quote = None;
                i += delim.len();
                continue;
            }
            i += 1;
            continue;
        }

        match b {
            b'\n' => {
                line += 1;
                at_line_start = true;
                i += 1;
                continue;
            }
            b' ' | b'\t' | b'\r' => {
                i += 1;
                continue;
            }
            b'#' if at_line_start => {
                i = skip_to_newline(i);
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = skip_to_newline(i);
                continue;
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                i = skip_to_newline(i);
                continue;
            }
            _ => {}
        }
        at_line_start = false;

        match b {
            b'"' if bytes[i..].starts_with(b"\"\"\"") => {
                quote = Some(b"\"\"\"");
                i += 3;
                continue;
            }
            b'"' => quote = Some(b"\""),
            b'\'' => quote = Some(b"'"),
            b'`' => quote = Some(b"`"),
            b'{' | b'(' | b'[' => stack.push((b, line)),
            b'}' | b')' | b']' => match stack.pop() {
                Some((open, _)) if closing_for(open) == b => {}
                Some((open, opened_at)) => {
                    return Err(format!(
                        "line {line}: '{}' does not close '{}' opened on line {opened_at}",
                        b as char, open as char
                    ));
                }
                None => return Err(format!("line {line}: unexpected '{}'", b as char)),
            },
            _ => {}
        }
        i += 1;
    }

    if quote.is_some() {
        return Err(format!("line {line}: unterminated string literal"));
    }
    if let Some((open, opened_at)) = stack.pop() {
        return Err(format!("line {opened_at}: unclosed '{}'", open as char));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{Connection, EMBEDDED_CONNECTION_NAME};
    use std::sync::Arc;

    fn embedded_only() -> ConnectionMap {
        let mut map = ConnectionMap::new();
        map.insert(
            EMBEDDED_CONNECTION_NAME.to_string(),
            Arc::new(Connection::embedded(Path::new("/pkgs/demo"))),
        );
        map
    }

    #[test]
    fn extracts_sources_views_queries_and_annotations() {
        let connections = embedded_only();
        let mut outliner = Outliner::new(&connections);
        let text = r#"
// flights model
#(schedule) cron="0 * * * *" action=refresh connection=duckdb
source: flights is duckdb.table('data/flights.parquet') extend {
  # bar_chart
  view: by_carrier is {
    group_by: carrier
    aggregate: flight_count is count()
  }
}

query: top_routes is flights -> by_carrier
"#;
        outliner.feed(text, 1).expect("outline");
        let outline = outliner.finish();

        assert_eq!(outline.sources.len(), 1);
        let flights = &outline.sources[0];
        assert_eq!(flights.name, "flights");
        assert_eq!(
            flights.annotations,
            vec![r#"#(schedule) cron="0 * * * *" action=refresh connection=duckdb"#.to_string()]
        );
        assert_eq!(flights.views.len(), 1);
        assert_eq!(flights.views[0].name, "by_carrier");
        assert_eq!(flights.views[0].annotations, vec!["# bar_chart".to_string()]);
        assert_eq!(outline.queries[0].name, "top_routes");
        assert!(outline.queries[0].annotations.is_empty());
    }

    #[test]
    fn rejects_unknown_connection() {
        let connections = embedded_only();
        let mut outliner = Outliner::new(&connections);
        let err = outliner
            .feed("source: orders is warehouse.table('public.orders')", 1)
            .expect_err("undefined connection");
        assert_eq!(err, "line 1: connection 'warehouse' is not defined");
    }

    #[test]
    fn reports_unbalanced_delimiters_with_line() {
        let err = check_balanced("source: a is duckdb.table('x') extend {\n  view: v is {\n}", 1)
            .expect_err("unclosed brace");
        assert_eq!(err, "line 1: unclosed '{'");

        let err = check_balanced("query: q is a -> { group_by: x )", 3).expect_err("mismatch");
        assert!(err.starts_with("line 3: ')' does not close '{'"));
    }

    #[test]
    fn delimiters_inside_strings_and_comments_are_ignored() {
        let text = r#"
# note: don't count (this
source: a is duckdb.sql("""
  SELECT '{' AS brace
""") // trailing ) comment
-- another } comment
"#;
        check_balanced(text, 1).expect("balanced");
    }

    #[test]
    fn notebook_cells_split_on_markers() {
        let connections = embedded_only();
        let mut outliner = Outliner::new(&connections);
        let text = ">>>markdown\n# Flights\n>>>malloy\nsource: f is duckdb.table('f.parquet')\n>>>malloy\nquery: busiest is f -> { aggregate: c is count() }\n";

        let cells = outline_notebook(&mut outliner, text).expect("notebook");
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[0].r#type, CellType::Markdown);
        assert_eq!(cells[0].text, "# Flights");
        assert_eq!(cells[1].query_name, None);
        assert_eq!(cells[2].query_name.as_deref(), Some("busiest"));

        let outline = outliner.finish();
        assert_eq!(outline.sources[0].name, "f");
    }

    #[test]
    fn notebook_diagnostics_use_file_line_numbers() {
        let connections = embedded_only();
        let mut outliner = Outliner::new(&connections);
        let text = ">>>markdown\ntitle\n>>>malloy\nsource: f is nowhere.table('f')\n";
        let err = outline_notebook(&mut outliner, text).expect_err("unknown connection");
        assert_eq!(err, "line 4: connection 'nowhere' is not defined");
    }
}
