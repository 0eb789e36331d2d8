//! The SCC graph over a program's relations.

use std::collections::BTreeSet;

use petgraph::{
    algo::tarjan_scc,
    graph::{DiGraph, NodeIndex},
};

use crate::ast::{Literal, Program, Term};

/// Strongly connected components of the relation dependency graph,
/// together with the partitions the translator's per-stratum plan needs.
///
/// Components are held in topological order: every relation a component
/// reads from lives in the same or an earlier component.
#[derive(Debug)]
pub struct SccGraph {
    graph: DiGraph<usize, ()>,
    nodes: Vec<NodeIndex>,
    sccs: Vec<Vec<usize>>,
    scc_of: Vec<usize>,
    outputs: Vec<bool>,
}

impl SccGraph {
    /// Build the graph for `program`. Edges run from a body relation to
    /// the head relation of each clause, including relations read inside
    /// negations and aggregate bodies.
    pub fn build(program: &Program) -> Self {
        let mut graph = DiGraph::<usize, ()>::new();
        let nodes: Vec<NodeIndex> = (0..program.relations().len())
            .map(|index| graph.add_node(index))
            .collect();

        for clause in program.clauses() {
            let Some(head) = program.relation_index(&clause.head.relation) else {
                continue;
            };
            let mut dependencies = BTreeSet::new();
            collect_dependencies(program, &clause.body, &mut dependencies);
            for term in &clause.head.terms {
                collect_term_dependencies(program, term, &mut dependencies);
            }
            for body in dependencies {
                graph.update_edge(nodes[body], nodes[head], ());
            }
        }

        // Tarjan emits components in reverse topological order of the
        // condensation; reversing puts dependencies first.
        let mut sccs: Vec<Vec<usize>> = tarjan_scc(&graph)
            .into_iter()
            .map(|component| {
                let mut relations: Vec<usize> =
                    component.into_iter().map(|node| graph[node]).collect();
                relations.sort_unstable();
                relations
            })
            .collect();
        sccs.reverse();

        let mut scc_of = vec![0; program.relations().len()];
        for (position, component) in sccs.iter().enumerate() {
            for &relation in component {
                scc_of[relation] = position;
            }
        }

        let outputs = program
            .relations()
            .iter()
            .map(|relation| relation.is_output())
            .collect();

        Self {
            graph,
            nodes,
            sccs,
            scc_of,
            outputs,
        }
    }

    /// Number of components.
    pub fn num_sccs(&self) -> usize {
        self.sccs.len()
    }

    /// Component positions in topological order.
    pub fn topological_order(&self) -> impl Iterator<Item = usize> {
        0..self.sccs.len()
    }

    /// The component a relation belongs to.
    pub fn scc_of(&self, relation: usize) -> usize {
        self.scc_of[relation]
    }

    /// Relations internal to a component, ordered by declaration.
    pub fn internal_relations(&self, scc: usize) -> &[usize] {
        &self.sccs[scc]
    }

    /// Whether evaluating the component requires iteration: either it has
    /// several members, or its single member reads from itself.
    pub fn is_recursive(&self, scc: usize) -> bool {
        let component = &self.sccs[scc];
        if component.len() > 1 {
            return true;
        }
        let relation = component[0];
        self.graph
            .contains_edge(self.nodes[relation], self.nodes[relation])
    }

    /// Relations outside the component that some member reads from.
    fn external_predecessors(&self, scc: usize) -> BTreeSet<usize> {
        let mut predecessors = BTreeSet::new();
        for &relation in &self.sccs[scc] {
            for neighbor in self
                .graph
                .neighbors_directed(self.nodes[relation], petgraph::Incoming)
            {
                let source = self.graph[neighbor];
                if self.scc_of[source] != scc {
                    predecessors.insert(source);
                }
            }
        }
        predecessors
    }

    /// External predecessors flagged as outputs.
    pub fn external_output_predecessors(&self, scc: usize) -> Vec<usize> {
        self.external_predecessors(scc)
            .into_iter()
            .filter(|&relation| self.outputs[relation])
            .collect()
    }

    /// External predecessors not flagged as outputs.
    pub fn external_non_output_predecessors(&self, scc: usize) -> Vec<usize> {
        self.external_predecessors(scc)
            .into_iter()
            .filter(|&relation| !self.outputs[relation])
            .collect()
    }

    /// Internal non-output relations that some later component reads from.
    pub fn internal_non_outputs_with_external_successors(&self, scc: usize) -> Vec<usize> {
        self.sccs[scc]
            .iter()
            .copied()
            .filter(|&relation| {
                !self.outputs[relation]
                    && self
                        .dependents(relation)
                        .iter()
                        .any(|&successor| self.scc_of[successor] != scc)
            })
            .collect()
    }

    /// Relations that read from `relation`, in declaration order.
    pub fn dependents(&self, relation: usize) -> Vec<usize> {
        let mut dependents: Vec<usize> = self
            .graph
            .neighbors_directed(self.nodes[relation], petgraph::Outgoing)
            .map(|node| self.graph[node])
            .collect();
        dependents.sort_unstable();
        dependents.dedup();
        dependents
    }
}

fn collect_dependencies(program: &Program, body: &[Literal], out: &mut BTreeSet<usize>) {
    for literal in body {
        match literal {
            Literal::Atom(atom) | Literal::Negation(atom) => {
                if let Some(index) = program.relation_index(&atom.relation) {
                    out.insert(index);
                }
                for term in &atom.terms {
                    collect_term_dependencies(program, term, out);
                }
            }
            Literal::Constraint(constraint) => {
                collect_term_dependencies(program, &constraint.lhs, out);
                collect_term_dependencies(program, &constraint.rhs, out);
            }
        }
    }
}

fn collect_term_dependencies(program: &Program, term: &Term, out: &mut BTreeSet<usize>) {
    match term {
        Term::Aggregator(aggregate) => {
            collect_dependencies(program, &aggregate.body, out);
            if let Some(target) = &aggregate.target {
                collect_term_dependencies(program, target, out);
            }
        }
        Term::Functor { args, .. } | Term::Record(args) => {
            for arg in args {
                collect_term_dependencies(program, arg, out);
            }
        }
        _ => {}
    }
}
