use crate::components::{
    block::Block,
    expressions::{BaseExpression, CallArguments, Expression},
    function::Function,
    program::Program,
    statement::{AssignTarget, Statement},
};

pub mod models;

pub use models::{BranchInfo, CodeAnalysis, CodeTreeNode, FunctionInfo, LoopInfo};

/// Extracts the purely lexical structure of a parsed (untransformed)
/// program: the element tree of functions, loops and branches, flat
/// per-kind lists, and the variable names of each scope. Nothing is
/// executed; this feeds the form builder.
pub struct StaticAnalyser {
    functions: Vec<FunctionInfo>,
    loops: Vec<LoopInfo>,
    branches: Vec<BranchInfo>,
    variables: Vec<String>,
}

impl StaticAnalyser {
    pub fn new() -> Self {
        Self {
            functions: Vec::new(),
            loops: Vec::new(),
            branches: Vec::new(),
            variables: Vec::new(),
        }
    }

    pub fn analyse(program: &Program) -> CodeAnalysis {
        let mut analyser = Self::new();

        let mut global_variables = Vec::new();
        collect_scope_variables(&program.statements, &mut global_variables);

        let mut children = Vec::new();
        for function in &program.functions {
            let node = analyser.walk_function_def(function);
            children.push(node);
        }
        for class in &program.classes {
            for method in &class.methods {
                let node = analyser.walk_function_def(method);
                children.push(node);
            }
        }
        for statement in &program.statements {
            analyser.walk_statement(statement, &global_variables, &mut children);
        }

        analyser.remember_variables(&global_variables);

        let (function_indices, loop_indices, branch_indices) = collect_indices(&children);
        let tree = CodeTreeNode {
            id: 0,
            node_type: "root".to_owned(),
            line_number: 0,
            variables: analyser.variables.clone(),
            function_indices,
            loop_indices,
            branch_indices,
            children,
        };

        return CodeAnalysis {
            tree,
            functions: analyser.functions,
            loops: analyser.loops,
            branches: analyser.branches,
            variables: analyser.variables,
        };
    }

    fn walk_function_def(&mut self, function: &Function) -> CodeTreeNode {
        let mut scope_variables = function
            .parameters
            .iter()
            .map(|parameter| parameter.value.clone())
            .collect::<Vec<_>>();
        collect_scope_variables(&function.code.statements, &mut scope_variables);
        self.remember_variables(&scope_variables);

        let index = self.functions.len();
        self.functions.push(FunctionInfo {
            name: function.name.value.clone(),
            line_number: function.line,
            parameters: function
                .parameters
                .iter()
                .map(|parameter| parameter.value.clone())
                .collect(),
            is_definition: true,
        });

        let mut children = Vec::new();
        for statement in &function.code.statements {
            self.walk_statement(statement, &scope_variables, &mut children);
        }

        let (function_indices, loop_indices, branch_indices) = collect_indices(&children);
        return CodeTreeNode {
            id: index,
            node_type: "function".to_owned(),
            line_number: function.line,
            variables: scope_variables,
            function_indices,
            loop_indices,
            branch_indices,
            children,
        };
    }

    fn walk_statement(
        &mut self,
        statement: &Statement,
        scope_variables: &[String],
        children: &mut Vec<CodeTreeNode>,
    ) {
        match statement {
            Statement::Assignment(_, value, _) | Statement::AugAssignment(_, _, value, _) => {
                self.walk_expression(value, scope_variables, children);
            }
            Statement::Expression(value, _) => {
                self.walk_expression(value, scope_variables, children);
            }
            Statement::If(statement) => {
                for (position, branch) in statement.branches.iter().enumerate() {
                    // Outer elements take their index before their children
                    // are discovered.
                    let index = self.branches.len();
                    self.branches.push(BranchInfo {
                        line_number: branch.line,
                        condition: branch.condition.to_string(),
                    });

                    let mut branch_children = Vec::new();
                    self.walk_expression(&branch.condition, scope_variables, &mut branch_children);
                    self.walk_block(&branch.block, scope_variables, &mut branch_children);

                    let is_last = position + 1 == statement.branches.len();
                    if is_last {
                        if let Some(default_block) = &statement.default_block {
                            self.walk_block(default_block, scope_variables, &mut branch_children);
                        }
                    }

                    children.push(self.element_node(
                        index,
                        "branch",
                        branch.line,
                        scope_variables,
                        branch_children,
                    ));
                }
            }
            Statement::For(statement) => {
                let index = self.loops.len();
                self.loops.push(LoopInfo {
                    line_number: statement.line,
                    loop_type: "for".to_owned(),
                    condition: statement.iterable.to_string(),
                });

                let mut loop_children = Vec::new();
                self.walk_expression(&statement.iterable, scope_variables, &mut loop_children);
                self.walk_block(&statement.body, scope_variables, &mut loop_children);

                children.push(self.element_node(
                    index,
                    "loop",
                    statement.line,
                    scope_variables,
                    loop_children,
                ));
            }
            Statement::While(statement) => {
                let index = self.loops.len();
                self.loops.push(LoopInfo {
                    line_number: statement.line,
                    loop_type: "while".to_owned(),
                    condition: statement.condition.to_string(),
                });

                let mut loop_children = Vec::new();
                self.walk_expression(&statement.condition, scope_variables, &mut loop_children);
                self.walk_block(&statement.body, scope_variables, &mut loop_children);

                children.push(self.element_node(
                    index,
                    "loop",
                    statement.line,
                    scope_variables,
                    loop_children,
                ));
            }
            Statement::Return(value, _) => {
                if let Some(value) = value {
                    self.walk_expression(value, scope_variables, children);
                }
            }
            _ => {}
        }
    }

    fn walk_block(
        &mut self,
        block: &Block,
        scope_variables: &[String],
        children: &mut Vec<CodeTreeNode>,
    ) {
        for statement in &block.statements {
            self.walk_statement(statement, scope_variables, children);
        }
    }

    /// Call sites become flat function elements: nested calls land in the
    /// same children list as their enclosing call.
    fn walk_expression(
        &mut self,
        expression: &Expression,
        scope_variables: &[String],
        children: &mut Vec<CodeTreeNode>,
    ) {
        self.walk_base(&expression.first, scope_variables, children);
        for (_, operand) in &expression.operations {
            self.walk_base(operand, scope_variables, children);
        }
    }

    fn walk_base(
        &mut self,
        expression: &BaseExpression,
        scope_variables: &[String],
        children: &mut Vec<CodeTreeNode>,
    ) {
        match expression {
            BaseExpression::VariableExpression(variable) => {
                if let Some(arguments) = &variable.arguments {
                    self.record_call_site(&variable.name.value, variable.line, scope_variables, children);
                    self.walk_arguments(arguments, scope_variables, children);
                }
            }
            BaseExpression::AccessorExpression(accessor) => {
                if let Some(arguments) = &accessor.arguments {
                    self.record_call_site(&accessor.name.value, accessor.line, scope_variables, children);
                    self.walk_arguments(arguments, scope_variables, children);
                }
                self.walk_base(&accessor.inner, scope_variables, children);
            }
            BaseExpression::IndexExpression(index) => {
                self.walk_base(&index.inner, scope_variables, children);
                self.walk_expression(&index.index, scope_variables, children);
            }
            BaseExpression::ListExpression(list) => {
                for value in &list.values {
                    self.walk_expression(value, scope_variables, children);
                }
            }
            BaseExpression::MapExpression(map) => {
                for (_, value) in &map.entries {
                    self.walk_expression(value, scope_variables, children);
                }
            }
            BaseExpression::BracketExpression(brackets) => {
                self.walk_expression(&brackets.inner, scope_variables, children);
            }
            _ => {}
        }
    }

    fn walk_arguments(
        &mut self,
        arguments: &CallArguments,
        scope_variables: &[String],
        children: &mut Vec<CodeTreeNode>,
    ) {
        for argument in &arguments.positional {
            self.walk_expression(argument, scope_variables, children);
        }
        for (_, argument) in &arguments.keyword {
            self.walk_expression(argument, scope_variables, children);
        }
    }

    fn record_call_site(
        &mut self,
        name: &str,
        line: usize,
        scope_variables: &[String],
        children: &mut Vec<CodeTreeNode>,
    ) {
        let index = self.functions.len();
        self.functions.push(FunctionInfo {
            name: name.to_owned(),
            line_number: line,
            parameters: Vec::new(),
            is_definition: false,
        });
        children.push(self.element_node(index, "function", line, scope_variables, Vec::new()));
    }

    fn element_node(
        &self,
        id: usize,
        node_type: &str,
        line_number: usize,
        scope_variables: &[String],
        children: Vec<CodeTreeNode>,
    ) -> CodeTreeNode {
        let (function_indices, loop_indices, branch_indices) = collect_indices(&children);
        CodeTreeNode {
            id,
            node_type: node_type.to_owned(),
            line_number,
            variables: scope_variables.to_vec(),
            function_indices,
            loop_indices,
            branch_indices,
            children,
        }
    }

    fn remember_variables(&mut self, names: &[String]) {
        for name in names {
            if !self.variables.contains(name) {
                self.variables.push(name.clone());
            }
        }
    }
}

impl Default for StaticAnalyser {
    fn default() -> Self {
        Self::new()
    }
}

/// The variable names a statement list binds in its own scope: assignment
/// targets (the base name for attribute/subscript targets) and loop targets,
/// including nested blocks, which share the scope.
fn collect_scope_variables(statements: &[Statement], into: &mut Vec<String>) {
    let mut remember = |name: String| {
        if !into.contains(&name) {
            into.push(name);
        }
    };

    for statement in statements {
        match statement {
            Statement::Assignment(target, _, _) | Statement::AugAssignment(target, _, _, _) => {
                for (name, _) in target.bound_names() {
                    remember(name.value);
                }
            }
            _ => {}
        }
    }

    for statement in statements {
        match statement {
            Statement::If(statement) => {
                for branch in &statement.branches {
                    collect_scope_variables(&branch.block.statements, into);
                }
                if let Some(default_block) = &statement.default_block {
                    collect_scope_variables(&default_block.statements, into);
                }
            }
            Statement::For(statement) => {
                for name in statement.target.names() {
                    if !into.contains(&name.value) {
                        into.push(name.value.clone());
                    }
                }
                collect_scope_variables(&statement.body.statements, into);
            }
            Statement::While(statement) => {
                collect_scope_variables(&statement.body.statements, into);
            }
            _ => {}
        }
    }
}

fn collect_indices(children: &[CodeTreeNode]) -> (Vec<usize>, Vec<usize>, Vec<usize>) {
    let mut function_indices = Vec::new();
    let mut loop_indices = Vec::new();
    let mut branch_indices = Vec::new();

    for child in children {
        match child.node_type.as_str() {
            "function" => function_indices.push(child.id),
            "loop" => loop_indices.push(child.id),
            "branch" => branch_indices.push(child.id),
            _ => {}
        }
        function_indices.extend(child.function_indices.iter().copied());
        loop_indices.extend(child.loop_indices.iter().copied());
        branch_indices.extend(child.branch_indices.iter().copied());
    }

    return (function_indices, loop_indices, branch_indices);
}

#[cfg(test)]
mod tests {
    use crate::{lexer::lex, parser};

    use super::*;

    fn analyse(source: &str) -> CodeAnalysis {
        let tokens = lex(source).collect::<Result<Vec<_>, _>>().unwrap();
        let program = parser::parse(&tokens).unwrap();
        StaticAnalyser::analyse(&program)
    }

    #[test]
    fn should_collect_functions_loops_and_branches() {
        let source = "func total(values) {\n  sum = 0;\n  for v in values {\n    if v > 0 {\n      sum = sum + v;\n    }\n  }\n  return sum;\n}\ntotal([1, 2]);\n";
        let analysis = analyse(source);

        assert_eq!(analysis.functions.len(), 2);
        assert!(analysis.functions[0].is_definition);
        assert_eq!(analysis.functions[0].name, "total");
        assert_eq!(analysis.functions[0].parameters, vec!["values"]);
        assert!(!analysis.functions[1].is_definition);

        assert_eq!(analysis.loops.len(), 1);
        assert_eq!(analysis.loops[0].loop_type, "for");
        assert_eq!(analysis.loops[0].line_number, 3);

        assert_eq!(analysis.branches.len(), 1);
        assert_eq!(analysis.branches[0].condition, "v > 0");
    }

    #[test]
    fn should_nest_elements_in_the_tree() {
        let source = "func total(values) {\n  sum = 0;\n  for v in values {\n    sum = sum + v;\n  }\n  return sum;\n}\n";
        let analysis = analyse(source);

        let function_node = &analysis.tree.children[0];
        assert_eq!(function_node.node_type, "function");
        assert_eq!(function_node.loop_indices, vec![0]);
        assert_eq!(function_node.children[0].node_type, "loop");
        assert!(function_node.variables.contains(&"values".to_owned()));
        assert!(function_node.variables.contains(&"sum".to_owned()));

        assert_eq!(analysis.tree.function_indices, vec![0]);
        assert_eq!(analysis.tree.loop_indices, vec![0]);
    }

    #[test]
    fn should_record_variables_in_first_seen_order() {
        let analysis = analyse("a = 1;\nb = 2;\nm.k = 3;\n");
        assert_eq!(analysis.variables, vec!["a", "b", "m"]);
    }

    #[test]
    fn should_record_while_loop_condition_text() {
        let analysis = analyse("num = 5;\nwhile num > 0 {\n  num -= 1;\n}\n");
        assert_eq!(analysis.loops[0].loop_type, "while");
        assert_eq!(analysis.loops[0].condition, "num > 0");
    }
}
