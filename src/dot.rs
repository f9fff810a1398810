//! Graphviz DOT export.
//!
//! [`BddManager::to_dot`] and [`ZddManager::to_dot`] serialise one diagram
//! as a directed labelled graph: square `T`/`F` terminals, numeric variable
//! labels on inner nodes, and one `T` and one `F` edge per inner node.
//! Rendering to pixel or vector formats is delegated to an external
//! Graphviz `dot` process via [`render_dot`]; Graphviz must be installed
//! for anything but [`ExportFormat::Dot`].

use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;
use std::io::{self, Write as _};
use std::path::Path;
use std::process::{Command, Stdio};

use crate::bdd::{BddManager, BddRef};
use crate::error::Result;
use crate::node::Node;
use crate::types::{Level, NodeId, Var};
use crate::zdd::{ZddManager, ZddRef};

/// Output formats for [`render_dot`] / `export_diagram`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ExportFormat {
    Dot,
    Fig,
    Gif,
    Pdf,
    Plain,
    Png,
    Ps,
    Svg,
}

impl ExportFormat {
    fn dot_type(self) -> &'static str {
        match self {
            ExportFormat::Dot => "dot",
            ExportFormat::Fig => "fig",
            ExportFormat::Gif => "gif",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Plain => "plain",
            ExportFormat::Png => "png",
            ExportFormat::Ps => "ps",
            ExportFormat::Svg => "svg",
        }
    }
}

/// Writes `dot` to `path`, rendering through the external Graphviz `dot`
/// binary for every format except [`ExportFormat::Dot`].
pub fn render_dot(dot: &str, format: ExportFormat, path: &Path) -> io::Result<()> {
    if format == ExportFormat::Dot {
        return std::fs::write(path, dot);
    }

    let mut child = Command::new("dot")
        .arg(format!("-T{}", format.dot_type()))
        .arg("-o")
        .arg(path)
        .stdin(Stdio::piped())
        .spawn()?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "failed to open stdin of the dot process"))?;
    stdin.write_all(dot.as_bytes())?;
    drop(stdin);

    let status = child.wait()?;
    if !status.success() {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("dot exited with {}", status),
        ));
    }
    Ok(())
}

/// Serialises the diagram under `root` given accessors for node data and
/// ordering levels. Shared by both variants.
fn diagram_dot(root: NodeId, node: impl Fn(NodeId) -> Node, level: impl Fn(Var) -> Level) -> String {
    let mut dot = String::new();
    writeln!(dot, "digraph DD {{").unwrap();
    writeln!(dot, "  rankdir=TB;").unwrap();
    writeln!(dot, "  node [shape=circle];").unwrap();
    writeln!(dot, "  lo_t [label=\"F\", shape=square];").unwrap();
    writeln!(dot, "  hi_t [label=\"T\", shape=square];").unwrap();

    // Collect inner nodes, grouped per level for layout.
    let mut visited: HashSet<u32> = HashSet::new();
    let mut by_level: BTreeMap<u32, Vec<NodeId>> = BTreeMap::new();
    let mut order: Vec<NodeId> = Vec::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if id.is_terminal() || !visited.insert(id.raw()) {
            continue;
        }
        let data = node(id);
        by_level.entry(level(data.var).raw()).or_default().push(id);
        order.push(id);
        stack.push(data.lo);
        stack.push(data.hi);
    }

    for nodes in by_level.values() {
        writeln!(dot, "  {{ rank=same;").unwrap();
        for &id in nodes {
            writeln!(dot, "    n{} [label=\"{}\"];", id.raw(), node(id).var.id()).unwrap();
        }
        writeln!(dot, "  }}").unwrap();
    }

    let target = |id: NodeId| match id {
        NodeId::LO => "lo_t".to_string(),
        NodeId::HI => "hi_t".to_string(),
        other => format!("n{}", other.raw()),
    };

    for &id in &order {
        let data = node(id);
        writeln!(dot, "  n{} -> {} [label=\"F\", style=dashed];", id.raw(), target(data.lo)).unwrap();
        writeln!(dot, "  n{} -> {} [label=\"T\"];", id.raw(), target(data.hi)).unwrap();
    }

    // A terminal root still needs its terminal box on the page; inner
    // diagrams reference them through edges already.
    if root.is_terminal() {
        writeln!(dot, "  root -> {} [style=bold];", target(root)).unwrap();
        writeln!(dot, "  root [shape=none, label=\"\"];").unwrap();
    }

    writeln!(dot, "}}").unwrap();
    dot
}

impl BddManager {
    /// Serialises the diagram of `f` in Graphviz DOT format.
    pub fn to_dot(&self, f: BddRef) -> Result<String> {
        let root = self.check(f)?;
        Ok(diagram_dot(
            root,
            |id| self.node_at(id),
            |var| self.ordering_ref().level_of(var),
        ))
    }

    /// Exports the diagram of `f` to a file, rendering through Graphviz.
    pub fn export_diagram(&self, f: BddRef, path: &Path, format: ExportFormat) -> io::Result<()> {
        let dot = self.to_dot(f).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        render_dot(&dot, format, path)
    }
}

impl ZddManager {
    /// Serialises the diagram of `f` in Graphviz DOT format.
    pub fn to_dot(&self, f: ZddRef) -> Result<String> {
        let root = self.check(f)?;
        Ok(diagram_dot(
            root,
            |id| self.node_at(id),
            |var| self.ordering_ref().level_of(var),
        ))
    }

    /// Exports the diagram of `f` to a file, rendering through Graphviz.
    pub fn export_diagram(&self, f: ZddRef, path: &Path, format: ExportFormat) -> io::Result<()> {
        let dot = self.to_dot(f).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        render_dot(&dot, format, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bdd_dot_shape() {
        let mgr = BddManager::new(&[0, 1], 64).unwrap();
        let x = mgr.hi_var(0).unwrap();
        let y = mgr.hi_var(1).unwrap();
        let f = mgr.and(x, y).unwrap();

        let dot = mgr.to_dot(f).unwrap();
        assert!(dot.contains("digraph DD"));
        assert!(dot.contains("shape=square"));
        assert!(dot.contains("label=\"T\""));
        assert!(dot.contains("label=\"F\", style=dashed"));
        // Two inner nodes, labelled by their variables.
        assert!(dot.contains("label=\"0\""));
        assert!(dot.contains("label=\"1\""));
    }

    #[test]
    fn test_terminal_dot() {
        let mgr = BddManager::new(&[0], 64).unwrap();
        let dot = mgr.to_dot(mgr.hi()).unwrap();
        assert!(dot.contains("hi_t"));
        assert!(dot.contains("root"));
    }

    #[test]
    fn test_zdd_dot_shape() {
        let mgr = ZddManager::new(&[0, 1, 2], 64).unwrap();
        let fam = mgr.family(&[vec![0, 2], vec![1]]).unwrap();
        let dot = mgr.to_dot(fam).unwrap();
        assert!(dot.contains("digraph DD"));
        assert!(dot.contains("rank=same"));
        assert!(dot.contains("lo_t"));
    }

    #[test]
    fn test_render_dot_writes_dot_file() {
        let mgr = BddManager::new(&[0, 1], 64).unwrap();
        let x = mgr.hi_var(0).unwrap();
        let dot = mgr.to_dot(x).unwrap();

        let path = std::env::temp_dir().join("dd_rs_dot_test.dot");
        render_dot(&dot, ExportFormat::Dot, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, dot);
        let _ = std::fs::remove_file(&path);
    }
}
