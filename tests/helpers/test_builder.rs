use symbol_graph::BuildOptions;
use symbol_graph::ModuleNode;
use symbol_graph::SourceAnalyzer;
use symbol_graph::SymbolGraph;

/// Builds symbol graphs from in memory sources.
pub struct TestBuilder {
  analyzer: SourceAnalyzer,
}

impl TestBuilder {
  pub fn new() -> Self {
    Self {
      analyzer: SourceAnalyzer::default(),
    }
  }

  pub fn with_files(files: &[(&str, &str)]) -> Self {
    let mut builder = Self::new();
    for (file_name, text) in files {
      builder.file(file_name, text);
    }
    builder
  }

  pub fn file(&mut self, file_name: &str, text: &str) -> &mut Self {
    self.analyzer.add(file_name, text);
    self
  }

  pub fn remove_file(&mut self, file_name: &str) -> &mut Self {
    self.analyzer.remove(file_name);
    self
  }

  pub fn build(&self) -> SymbolGraph {
    symbol_graph::build_graph(
      self.analyzer.graph_files(),
      &self.analyzer,
      Default::default(),
    )
  }

  pub fn rebuild(&self, previous: &SymbolGraph) -> SymbolGraph {
    symbol_graph::build_graph(
      self.analyzer.graph_files(),
      &self.analyzer,
      BuildOptions {
        previous: Some(previous),
        ..Default::default()
      },
    )
  }

  /// The module node of one file, resolved against the other files.
  pub fn module_node(files: &[(&str, &str)], file_name: &str) -> ModuleNode {
    let graph = Self::with_files(files).build();
    graph.get(file_name).unwrap().clone()
  }
}
