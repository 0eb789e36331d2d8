//! The relation-expiry schedule.

use crate::ast::Program;

use super::scc_graph::SccGraph;

/// For each position of the topological order, the relations whose last
/// consumer is that stratum. A relation expires where the furthest
/// component reading it lives; outputs have been stored by then and
/// expire like everything else.
#[derive(Debug)]
pub struct RelationSchedule {
    expired: Vec<Vec<usize>>,
}

impl RelationSchedule {
    /// Compute the schedule for `program`.
    pub fn compute(program: &Program, scc_graph: &SccGraph) -> Self {
        let mut expired = vec![Vec::new(); scc_graph.num_sccs()];

        for relation in 0..program.relations().len() {
            let mut last_use = scc_graph.scc_of(relation);
            for dependent in scc_graph.dependents(relation) {
                last_use = last_use.max(scc_graph.scc_of(dependent));
            }
            expired[last_use].push(relation);
        }

        Self { expired }
    }

    /// Relations expiring at the given position of the topological order.
    pub fn expired_at(&self, index: usize) -> &[usize] {
        &self.expired[index]
    }
}

#[cfg(test)]
mod test {
    use crate::ast::{Atom, Clause, Literal, Program, Relation, Term};

    use super::super::scc_graph::SccGraph;
    use super::RelationSchedule;

    #[test]
    fn relations_expire_at_their_last_consumer() {
        let mut program = Program::new();
        program
            .add_relation(Relation::numeric("a", &["x"]).input())
            .add_relation(Relation::numeric("b", &["x"]))
            .add_relation(Relation::numeric("c", &["x"]).output())
            .add_clause(Clause::rule(
                Atom::new("b", vec![Term::var("x")]),
                vec![Literal::Atom(Atom::new("a", vec![Term::var("x")]))],
            ))
            .add_clause(Clause::rule(
                Atom::new("c", vec![Term::var("x")]),
                vec![Literal::Atom(Atom::new("b", vec![Term::var("x")]))],
            ));

        let scc_graph = SccGraph::build(&program);
        let schedule = RelationSchedule::compute(&program, &scc_graph);

        let a = program.relation_index("a").unwrap();
        let b = program.relation_index("b").unwrap();
        let c = program.relation_index("c").unwrap();

        // a is consumed where b is computed; b where c is computed; c in
        // its own stratum.
        assert_eq!(schedule.expired_at(scc_graph.scc_of(b)), &[a]);
        assert_eq!(schedule.expired_at(scc_graph.scc_of(c)), &[b, c]);
    }
}
