//! Organizational hierarchy resolver.
//!
//! The organigram is a multi-parent graph: the primary `reports_to` links form
//! the structural spine, and every additional role adds a parallel edge to a
//! possibly different supervisor. An employee can therefore show up under
//! several parents at once. `OrgChart` indexes those typed edges once per
//! snapshot and answers root / subordinate / role-label queries over them.
//!
//! Edges that point at an unknown employee, or at the employee itself, are
//! recorded as orphaned references and never followed.

use crate::model::{EdgeKind, Employee, RoleView};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// Default render depth guard.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// How additional-role supervisors affect root classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootPolicy {
    /// Root iff the primary role has no supervisor. An additional role with a
    /// supervisor does not disqualify the employee; it is rendered both as a
    /// root and, dashed, under that supervisor.
    #[default]
    PrimaryOnly,
    /// Root iff no role at all has a resolvable supervisor.
    AnyRole,
}

/// A supervisor link that cannot be followed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanRef {
    pub employee_id: String,
    pub kind: EdgeKind,
    pub missing_supervisor: String,
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    child: usize,
    kind: EdgeKind,
}

/// Role label shown for a node under a particular parent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleLabel {
    pub job_title: String,
    pub department: String,
    pub kind: EdgeKind,
}

impl From<RoleView<'_>> for RoleLabel {
    fn from(r: RoleView<'_>) -> Self {
        Self {
            job_title: r.job_title.to_string(),
            department: r.department.to_string(),
            kind: r.kind,
        }
    }
}

/// One rendered node of the organigram.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgNode {
    pub employee_id: String,
    pub name: String,
    /// Roles that place this employee under its parent (primary role for roots).
    pub roles: Vec<RoleLabel>,
    /// Linked to its parent only through additional roles (drawn dashed).
    pub dashed: bool,
    /// The employee already appears on the path above; children were cut.
    pub cycle: bool,
    /// `max_depth` reached; children were cut.
    pub truncated: bool,
    pub children: Vec<OrgNode>,
}

pub struct OrgChart<'a> {
    employees: &'a [Employee],
    index: HashMap<&'a str, usize>,
    children: HashMap<&'a str, Vec<Edge>>,
    orphans: Vec<OrphanRef>,
    policy: RootPolicy,
    max_depth: usize,
}

impl<'a> OrgChart<'a> {
    pub fn new(employees: &'a [Employee]) -> Self {
        Self::with_policy(employees, RootPolicy::default(), DEFAULT_MAX_DEPTH)
    }

    pub fn with_policy(employees: &'a [Employee], policy: RootPolicy, max_depth: usize) -> Self {
        let mut index = HashMap::with_capacity(employees.len());
        for (i, e) in employees.iter().enumerate() {
            if index.insert(e.id.as_str(), i).is_some() {
                log::warn!("Duplicate employee id '{}'; later record wins", e.id);
            }
        }

        let mut children: HashMap<&'a str, Vec<Edge>> = HashMap::new();
        let mut orphans = Vec::new();
        for (i, e) in employees.iter().enumerate() {
            for role in e.roles() {
                let Some(sup) = role.reports_to else { continue };
                if sup == e.id || !index.contains_key(sup) {
                    log::warn!(
                        "Employee {} ({:?}) reports to unknown or self id '{sup}'",
                        e.id,
                        role.kind
                    );
                    orphans.push(OrphanRef {
                        employee_id: e.id.clone(),
                        kind: role.kind,
                        missing_supervisor: sup.to_string(),
                    });
                    continue;
                }
                children.entry(sup).or_default().push(Edge { child: i, kind: role.kind });
            }
        }

        Self {
            employees,
            index,
            children,
            orphans,
            policy,
            max_depth,
        }
    }

    pub fn policy(&self) -> RootPolicy {
        self.policy
    }

    pub fn employee(&self, id: &str) -> Option<&'a Employee> {
        self.index.get(id).map(|&i| &self.employees[i])
    }

    pub fn orphaned_references(&self) -> &[OrphanRef] {
        &self.orphans
    }

    fn resolves(&self, employee: &Employee, sup: Option<&str>) -> bool {
        matches!(sup, Some(s) if s != employee.id && self.index.contains_key(s))
    }

    /// Whether `employee` starts its own subtree.
    ///
    /// A dangling primary supervisor counts as absent only when no additional
    /// role claims the employee; otherwise it is reachable through that role.
    pub fn is_root(&self, employee: &Employee) -> bool {
        let primary_resolves = self.resolves(employee, employee.reports_to.as_deref());
        if primary_resolves {
            return false;
        }
        let any_additional_resolves = employee
            .additional_roles
            .iter()
            .any(|r| self.resolves(employee, r.reports_to.as_deref()));
        match self.policy {
            RootPolicy::PrimaryOnly => employee.reports_to.is_none() || !any_additional_resolves,
            RootPolicy::AnyRole => !any_additional_resolves,
        }
    }

    /// Employees with no structural parent, in input order.
    pub fn roots(&self) -> Vec<&'a Employee> {
        self.employees.iter().filter(|e| self.is_root(e)).collect()
    }

    /// Everyone reporting to `supervisor_id` through any role, once each, in input order.
    pub fn subordinates_of(&self, supervisor_id: &str) -> Vec<&'a Employee> {
        let Some(edges) = self.children.get(supervisor_id) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        let mut idx: Vec<usize> = edges.iter().map(|e| e.child).filter(|c| seen.insert(*c)).collect();
        idx.sort_unstable();
        idx.into_iter().map(|i| &self.employees[i]).collect()
    }

    /// Typed edges below `supervisor_id`: one entry per role routed there.
    pub fn edges_under(&self, supervisor_id: &str) -> Vec<(&'a Employee, EdgeKind)> {
        self.children
            .get(supervisor_id)
            .map(|edges| edges.iter().map(|e| (&self.employees[e.child], e.kind)).collect())
            .unwrap_or_default()
    }

    /// Direct supervisors of `employee_id` across all roles, once each.
    pub fn supervisors_of(&self, employee_id: &str) -> Vec<&'a Employee> {
        let Some(e) = self.employee(employee_id) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        e.roles()
            .filter_map(|r| r.reports_to)
            .filter(|s| *s != e.id)
            .filter_map(|s| self.employee(s))
            .filter(|s| seen.insert(s.id.as_str()))
            .collect()
    }

    /// True if `ancestor_id` is above `employee_id` through any chain of roles.
    pub fn is_above(&self, ancestor_id: &str, employee_id: &str) -> bool {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([employee_id]);
        while let Some(id) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            for sup in self.supervisors_of(id) {
                if sup.id == ancestor_id {
                    return true;
                }
                queue.push_back(sup.id.as_str());
            }
        }
        false
    }

    /// Render the organigram depth-first from every root.
    pub fn tree(&self) -> Vec<OrgNode> {
        self.roots()
            .into_iter()
            .map(|root| {
                let mut path = HashSet::new();
                let labels = vec![RoleLabel::from(root.primary_role())];
                self.render(root, labels, false, &mut path, 0)
            })
            .collect()
    }

    fn render(
        &self,
        employee: &'a Employee,
        roles: Vec<RoleLabel>,
        dashed: bool,
        path: &mut HashSet<&'a str>,
        depth: usize,
    ) -> OrgNode {
        let mut node = OrgNode {
            employee_id: employee.id.clone(),
            name: employee.name.clone(),
            roles,
            dashed,
            cycle: false,
            truncated: false,
            children: Vec::new(),
        };
        if !path.insert(employee.id.as_str()) {
            log::warn!("Reporting cycle through employee {}; subtree cut", employee.id);
            node.cycle = true;
            return node;
        }
        if depth >= self.max_depth {
            node.truncated = !self.subordinates_of(&employee.id).is_empty();
        } else {
            for child in self.subordinates_of(&employee.id) {
                let under = roles_under(child, &employee.id);
                let dashed = under.iter().all(|r| r.kind.is_additional());
                let labels = under.into_iter().map(RoleLabel::from).collect();
                node.children.push(self.render(child, labels, dashed, path, depth + 1));
            }
        }
        path.remove(employee.id.as_str());
        node
    }

    /// Employees that appear nowhere in the rendered tree.
    pub fn unreachable(&self) -> Vec<&'a Employee> {
        let mut reached: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = self.roots().iter().map(|e| e.id.as_str()).collect();
        while let Some(id) = stack.pop() {
            if !reached.insert(id) {
                continue;
            }
            for child in self.subordinates_of(id) {
                stack.push(child.id.as_str());
            }
        }
        self.employees
            .iter()
            .filter(|e| !reached.contains(e.id.as_str()))
            .collect()
    }
}

/// The employee's roles (primary included) whose supervisor is `supervisor_id`.
pub fn roles_under<'e>(employee: &'e Employee, supervisor_id: &str) -> Vec<RoleView<'e>> {
    employee
        .roles()
        .filter(|r| r.reports_to == Some(supervisor_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(es: &[&Employee]) -> Vec<String> {
        es.iter().map(|e| e.id.clone()).collect()
    }

    #[test]
    fn two_roles_under_same_supervisor_listed_once() {
        let staff = vec![
            Employee::new("1", "Ana", "Dirección", "Gerente"),
            Employee::new("2", "Luis", "Producción", "Jefe")
                .reporting_to("1")
                .with_role("Asistente", "Calidad", Some("1")),
        ];
        let chart = OrgChart::new(&staff);
        assert_eq!(ids(&chart.subordinates_of("1")), vec!["2"]);
        assert_eq!(roles_under(&staff[1], "1").len(), 2);

        let tree = chart.tree();
        assert_eq!(tree[0].children.len(), 1);
        assert_eq!(tree[0].children[0].roles.len(), 2);
        assert!(!tree[0].children[0].dashed);
    }

    #[test]
    fn self_reference_is_an_orphan() {
        let staff = vec![Employee::new("1", "Ana", "Dirección", "Gerente").reporting_to("1")];
        let chart = OrgChart::new(&staff);
        assert_eq!(chart.orphaned_references().len(), 1);
        assert_eq!(ids(&chart.roots()), vec!["1"]);
    }
}
