//! Finalized access-control model: grant table + role inheritance graph.
//!
//! The model is assembled with [`AccessControlBuilder`] and becomes queryable
//! only once [`AccessControlBuilder::finalize`] has validated the inheritance
//! graph. A finalized [`AccessControl`] has no mutating methods.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::{Action, Attribute, AttributeSet, AuthzError, Grant, Resource, Role};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GrantKey {
    role: Role,
    resource: Resource,
    action: Action,
}

/// Mutable assembly stage of the model. Cannot answer queries.
#[derive(Debug, Clone, Default)]
pub struct AccessControlBuilder {
    grants: Vec<Grant>,
    extends: BTreeMap<Role, Vec<Role>>,
    declared: BTreeSet<Role>,
}

impl AccessControlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a role that may have no grants of its own.
    pub fn role(mut self, role: Role) -> Self {
        self.declared.insert(role);
        self
    }

    pub fn grant(
        mut self,
        role: Role,
        resource: Resource,
        action: Action,
        attributes: impl IntoIterator<Item = Attribute>,
    ) -> Self {
        self.grants.push(Grant::new(role, resource, action, attributes));
        self
    }

    pub fn with_grant(mut self, grant: Grant) -> Self {
        self.grants.push(grant);
        self
    }

    /// `role` additionally receives every grant of each of `parents`.
    pub fn extend(mut self, role: Role, parents: impl IntoIterator<Item = Role>) -> Self {
        self.extends.entry(role).or_default().extend(parents);
        self
    }

    /// Validate the inheritance graph and lock the model.
    ///
    /// Fails if a role extends a role that appears nowhere in the model, or
    /// if the extends graph contains a cycle (including self-extension).
    pub fn finalize(self) -> Result<AccessControl, AuthzError> {
        let mut known: BTreeSet<Role> = self.declared;
        known.extend(self.grants.iter().map(|g| g.role.clone()));
        known.extend(self.extends.keys().cloned());

        for (role, parents) in &self.extends {
            if let Some(parent) = parents.iter().find(|p| !known.contains(*p)) {
                return Err(AuthzError::UnknownParent {
                    role: role.clone(),
                    parent: parent.clone(),
                });
            }
        }

        if let Some(cycle) = find_cycle(&self.extends) {
            return Err(AuthzError::CyclicInheritance(cycle));
        }

        let closures: BTreeMap<Role, Vec<Role>> = known
            .iter()
            .map(|role| (role.clone(), closure_of(role, &self.extends)))
            .collect();

        let mut grants: HashMap<GrantKey, AttributeSet> = HashMap::new();
        for grant in &self.grants {
            let key = GrantKey {
                role: grant.role.clone(),
                resource: grant.resource.clone(),
                action: grant.action,
            };
            grants.entry(key).or_default().extend_from(&grant.attributes);
        }

        tracing::debug!(
            roles = closures.len(),
            grants = grants.len(),
            "access control finalized"
        );

        Ok(AccessControl {
            grants,
            extends: self.extends,
            closures,
        })
    }
}

/// Result of resolving a (role, resource, action) query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionQuery {
    pub role: Option<Role>,
    pub resource: Resource,
    pub action: Action,
    pub granted: bool,
    pub attributes: AttributeSet,
}

impl PermissionQuery {
    /// Whether this permission applies to `attribute` (wildcard-aware).
    pub fn covers(&self, attribute: &Attribute) -> bool {
        self.granted && self.attributes.covers(attribute)
    }

    /// Keep only the candidate attributes this permission covers.
    pub fn filter_attributes<'a, I>(&self, candidates: I) -> Vec<Attribute>
    where
        I: IntoIterator<Item = &'a Attribute>,
    {
        candidates
            .into_iter()
            .filter(|a| self.covers(a))
            .cloned()
            .collect()
    }
}

/// Immutable, validated permission model.
#[derive(Debug, Clone)]
pub struct AccessControl {
    grants: HashMap<GrantKey, AttributeSet>,
    extends: BTreeMap<Role, Vec<Role>>,
    /// Reflexive-transitive closure of the extends graph, per known role.
    closures: BTreeMap<Role, Vec<Role>>,
}

impl AccessControl {
    pub fn builder() -> AccessControlBuilder {
        AccessControlBuilder::new()
    }

    /// Every role known to the model, sorted.
    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.closures.keys()
    }

    /// Direct parents declared for `role`.
    pub fn parents(&self, role: &Role) -> &[Role] {
        self.extends.get(role).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `role` plus every role it transitively extends.
    ///
    /// A role unknown to the model has only itself in its closure.
    pub fn closure(&self, role: &Role) -> Vec<Role> {
        self.closures
            .get(role)
            .cloned()
            .unwrap_or_else(|| vec![role.clone()])
    }

    fn contributions(
        &self,
        role: &Role,
        resource: &Resource,
        action: Action,
    ) -> Vec<(Role, &AttributeSet)> {
        self.closure(role)
            .into_iter()
            .filter_map(|member| {
                let key = GrantKey {
                    role: member,
                    resource: resource.clone(),
                    action,
                };
                let attrs = self.grants.get(&key)?;
                Some((key.role, attrs))
            })
            .collect()
    }

    /// Resolve a query. `None` is the "no role" sentinel and is never granted.
    ///
    /// Unknown resources and actions simply resolve to a denial.
    pub fn resolve(&self, role: Option<&Role>, resource: &Resource, action: Action) -> PermissionQuery {
        let Some(role) = role else {
            return PermissionQuery {
                role: None,
                resource: resource.clone(),
                action,
                granted: false,
                attributes: AttributeSet::new(),
            };
        };

        let contributions = self.contributions(role, resource, action);
        let mut attributes = AttributeSet::new();
        for (_, attrs) in &contributions {
            attributes.extend_from(attrs);
        }

        PermissionQuery {
            role: Some(role.clone()),
            resource: resource.clone(),
            action,
            granted: !contributions.is_empty(),
            attributes,
        }
    }

    pub fn can(&self, role: Option<&Role>, resource: &Resource, action: Action) -> bool {
        self.resolve(role, resource, action).granted
    }

    /// Like [`resolve`](Self::resolve) but a denial is an error.
    pub fn check(&self, role: &Role, resource: &Resource, action: Action) -> Result<PermissionQuery, AuthzError> {
        let query = self.resolve(Some(role), resource, action);
        if query.granted {
            Ok(query)
        } else {
            Err(AuthzError::Forbidden {
                role: role.clone(),
                resource: resource.clone(),
                action,
            })
        }
    }

    /// Explain which roles contributed to a decision.
    pub fn explain(&self, role: Option<&Role>, resource: &Resource, action: Action) -> AccessExplanation {
        let Some(role) = role else {
            return AccessExplanation {
                role: None,
                resource: resource.to_string(),
                action: action.to_string(),
                granted: false,
                reason: "no role present; anonymous sessions hold no grants".to_string(),
                inherited_roles: Vec::new(),
                contributing_grants: Vec::new(),
            };
        };

        let closure = self.closure(role);
        let contributing_grants: Vec<ContributingGrant> = self
            .contributions(role, resource, action)
            .into_iter()
            .map(|(role, attrs)| ContributingGrant {
                role: role.to_string(),
                attributes: attrs.iter().map(|a| a.to_string()).collect(),
            })
            .collect();

        let granted = !contributing_grants.is_empty();
        let reason = if granted {
            let roles: Vec<&str> = contributing_grants.iter().map(|g| g.role.as_str()).collect();
            format!("{action} on '{resource}' granted through {roles:?}")
        } else {
            format!("no role in {closure:?} holds {action} on '{resource}'")
        };

        AccessExplanation {
            role: Some(role.to_string()),
            resource: resource.to_string(),
            action: action.to_string(),
            granted,
            reason,
            inherited_roles: closure.iter().filter(|r| *r != role).map(|r| r.to_string()).collect(),
            contributing_grants,
        }
    }
}

/// Debuggable account of a permission decision.
#[derive(Debug, Clone, Serialize)]
pub struct AccessExplanation {
    pub role: Option<String>,
    pub resource: String,
    pub action: String,
    pub granted: bool,
    pub reason: String,
    pub inherited_roles: Vec<String>,
    pub contributing_grants: Vec<ContributingGrant>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContributingGrant {
    pub role: String,
    pub attributes: Vec<String>,
}

fn closure_of(role: &Role, extends: &BTreeMap<Role, Vec<Role>>) -> Vec<Role> {
    let mut seen: BTreeSet<Role> = BTreeSet::new();
    let mut stack = vec![role.clone()];

    while let Some(next) = stack.pop() {
        if let Some(parents) = extends.get(&next) {
            stack.extend(parents.iter().filter(|p| !seen.contains(*p)).cloned());
        }
        seen.insert(next);
    }

    seen.into_iter().collect()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Returns the first cycle found, as a path that starts and ends on the same role.
fn find_cycle(extends: &BTreeMap<Role, Vec<Role>>) -> Option<Vec<Role>> {
    fn visit<'a>(
        role: &'a Role,
        extends: &'a BTreeMap<Role, Vec<Role>>,
        marks: &mut HashMap<&'a Role, Mark>,
        path: &mut Vec<&'a Role>,
    ) -> Option<Vec<Role>> {
        match marks.get(role) {
            Some(Mark::Done) => return None,
            Some(Mark::Visiting) => {
                let start = path.iter().position(|r| *r == role).unwrap_or(0);
                let mut cycle: Vec<Role> = path[start..].iter().map(|r| (*r).clone()).collect();
                cycle.push(role.clone());
                return Some(cycle);
            }
            None => {}
        }

        marks.insert(role, Mark::Visiting);
        path.push(role);
        for parent in extends.get(role).into_iter().flatten() {
            if let Some(cycle) = visit(parent, extends, marks, path) {
                return Some(cycle);
            }
        }
        path.pop();
        marks.insert(role, Mark::Done);
        None
    }

    let mut marks = HashMap::new();
    let mut path = Vec::new();
    extends
        .keys()
        .find_map(|role| visit(role, extends, &mut marks, &mut path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn public() -> Attribute {
        Attribute::new("Public")
    }

    fn participants_only() -> Attribute {
        Attribute::new("ParticipantsOnly")
    }

    fn announcements_model() -> AccessControl {
        AccessControl::builder()
            .grant(Role::APPLICANT, Resource::ANNOUNCEMENTS, Action::READ_ANY, [public()])
            .grant(
                Role::PARTICIPANT,
                Resource::ANNOUNCEMENTS,
                Action::READ_ANY,
                [participants_only()],
            )
            .extend(Role::PARTICIPANT, [Role::APPLICANT])
            .finalize()
            .unwrap()
    }

    #[test]
    fn inherited_attribute_sets_union() {
        let ac = announcements_model();
        let query = ac.resolve(Some(&Role::PARTICIPANT), &Resource::ANNOUNCEMENTS, Action::READ_ANY);

        assert!(query.granted);
        let expected: AttributeSet = [public(), participants_only()].into_iter().collect();
        assert_eq!(query.attributes, expected);
    }

    #[test]
    fn parent_does_not_receive_child_grants() {
        let ac = announcements_model();
        let query = ac.resolve(Some(&Role::APPLICANT), &Resource::ANNOUNCEMENTS, Action::READ_ANY);

        assert!(query.granted);
        assert!(query.covers(&public()));
        assert!(!query.covers(&participants_only()));
    }

    #[test]
    fn no_role_is_a_plain_denial() {
        let ac = announcements_model();
        let query = ac.resolve(None, &Resource::ANNOUNCEMENTS, Action::READ_ANY);

        assert!(!query.granted);
        assert!(query.attributes.is_empty());
        assert!(!ac.can(None, &Resource::ANNOUNCEMENTS, Action::READ_ANY));
    }

    #[test]
    fn unknown_resource_or_action_is_denied() {
        let ac = announcements_model();

        let query = ac.resolve(Some(&Role::PARTICIPANT), &Resource::new("polls"), Action::READ_ANY);
        assert!(!query.granted);
        assert!(query.attributes.is_empty());

        let query = ac.resolve(Some(&Role::PARTICIPANT), &Resource::ANNOUNCEMENTS, Action::DELETE_OWN);
        assert!(!query.granted);
    }

    #[test]
    fn unknown_role_resolves_to_denial() {
        let ac = announcements_model();
        assert!(!ac.can(Some(&Role::new("sponsor")), &Resource::ANNOUNCEMENTS, Action::READ_ANY));
        assert_eq!(ac.closure(&Role::new("sponsor")), vec![Role::new("sponsor")]);
    }

    #[test]
    fn wildcard_grant_covers_unlisted_attribute() {
        let ac = AccessControl::builder()
            .grant(Role::ADMINISTRATOR, Resource::USERS, Action::UPDATE_ANY, [Attribute::WILDCARD])
            .grant(Role::APPLICANT, Resource::USERS, Action::UPDATE_OWN, [Attribute::new("firstName")])
            .finalize()
            .unwrap();

        let query = ac.resolve(Some(&Role::ADMINISTRATOR), &Resource::USERS, Action::UPDATE_ANY);
        assert!(query.covers(&Attribute::new("firstName")));
        assert!(query.covers(&Attribute::new("a-field-nobody-declared")));
    }

    #[test]
    fn filter_attributes_keeps_covered_candidates() {
        let ac = announcements_model();
        let query = ac.resolve(Some(&Role::APPLICANT), &Resource::ANNOUNCEMENTS, Action::READ_ANY);
        let candidates = [public(), participants_only()];

        assert_eq!(query.filter_attributes(&candidates), vec![public()]);
    }

    #[test]
    fn diamond_inheritance_counts_shared_ancestor_once() {
        let base = Role::new("base");
        let left = Role::new("left");
        let right = Role::new("right");
        let top = Role::new("top");

        let ac = AccessControl::builder()
            .grant(base.clone(), Resource::EVENTS, Action::READ_ANY, [public()])
            .extend(left.clone(), [base.clone()])
            .extend(right.clone(), [base.clone()])
            .extend(top.clone(), [left.clone(), right.clone()])
            .finalize()
            .unwrap();

        assert_eq!(ac.closure(&top), vec![base, left, right, top.clone()]);
        let query = ac.resolve(Some(&top), &Resource::EVENTS, Action::READ_ANY);
        assert_eq!(query.attributes.len(), 1);
    }

    #[test]
    fn cycles_are_rejected_at_finalize() {
        let a = Role::new("a");
        let b = Role::new("b");
        let err = AccessControl::builder()
            .extend(a.clone(), [b.clone()])
            .extend(b.clone(), [a.clone()])
            .finalize()
            .unwrap_err();

        match err {
            AuthzError::CyclicInheritance(path) => {
                assert_eq!(path.first(), path.last());
                assert!(path.contains(&a) && path.contains(&b));
            }
            other => panic!("expected cycle error, got {other:?}"),
        }
    }

    #[test]
    fn self_extension_is_a_cycle() {
        let err = AccessControl::builder()
            .extend(Role::VOLUNTEER, [Role::VOLUNTEER])
            .finalize()
            .unwrap_err();
        assert!(matches!(err, AuthzError::CyclicInheritance(_)));
    }

    #[test]
    fn extending_an_undeclared_role_is_rejected() {
        let err = AccessControl::builder()
            .extend(Role::PARTICIPANT, [Role::new("ghost")])
            .finalize()
            .unwrap_err();
        assert_eq!(
            err,
            AuthzError::UnknownParent {
                role: Role::PARTICIPANT,
                parent: Role::new("ghost"),
            }
        );
    }

    #[test]
    fn check_turns_denial_into_forbidden() {
        let ac = announcements_model();
        assert!(ac.check(&Role::APPLICANT, &Resource::ANNOUNCEMENTS, Action::READ_ANY).is_ok());
        assert!(matches!(
            ac.check(&Role::APPLICANT, &Resource::ANNOUNCEMENTS, Action::CREATE_ANY),
            Err(AuthzError::Forbidden { .. })
        ));
    }

    #[test]
    fn explain_names_contributing_roles() {
        let ac = announcements_model();
        let explanation = ac.explain(Some(&Role::PARTICIPANT), &Resource::ANNOUNCEMENTS, Action::READ_ANY);

        assert!(explanation.granted);
        assert_eq!(explanation.inherited_roles, vec!["applicant".to_string()]);
        assert_eq!(explanation.contributing_grants.len(), 2);

        let denied = ac.explain(None, &Resource::ANNOUNCEMENTS, Action::READ_ANY);
        assert!(!denied.granted);
    }

    // ── properties ──────────────────────────────────────────────────────────

    const ROLES: usize = 6;
    const RESOURCES: [Resource; 3] = [Resource::EVENTS, Resource::TEAMS, Resource::ANNOUNCEMENTS];

    fn role(i: usize) -> Role {
        Role::new(format!("r{i}"))
    }

    fn attribute(i: usize) -> Attribute {
        match i {
            0 => Attribute::WILDCARD,
            n => Attribute::new(format!("a{n}")),
        }
    }

    /// Edges only point from a higher index to a lower one, so the graph is acyclic.
    fn build(
        adjacency: &[Vec<bool>],
        grants: &[(usize, usize, usize, usize)],
        reverse: bool,
    ) -> AccessControl {
        let mut builder = AccessControl::builder();
        for i in 0..ROLES {
            builder = builder.role(role(i));
            let mut parents: Vec<Role> = (0..i).filter(|&j| adjacency[i][j]).map(role).collect();
            if reverse {
                parents.reverse();
            }
            builder = builder.extend(role(i), parents);
        }

        let mut ordered: Vec<_> = grants.to_vec();
        if reverse {
            ordered.reverse();
        }
        for (r, res, act, attr) in ordered {
            builder = builder.grant(role(r), RESOURCES[res].clone(), Action::all()[act], [attribute(attr)]);
        }

        builder.finalize().unwrap()
    }

    fn graph_strategy() -> impl Strategy<Value = (Vec<Vec<bool>>, Vec<(usize, usize, usize, usize)>)> {
        (
            prop::collection::vec(prop::collection::vec(any::<bool>(), ROLES), ROLES),
            prop::collection::vec((0..ROLES, 0..RESOURCES.len(), 0..8usize, 0..4usize), 0..24),
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: resolution does not depend on declaration order of parents or grants.
        #[test]
        fn resolution_is_declaration_order_independent((adjacency, grants) in graph_strategy()) {
            let forward = build(&adjacency, &grants, false);
            let backward = build(&adjacency, &grants, true);

            for i in 0..ROLES {
                for resource in &RESOURCES {
                    for action in Action::all() {
                        let a = forward.resolve(Some(&role(i)), resource, action);
                        let b = backward.resolve(Some(&role(i)), resource, action);
                        prop_assert_eq!(a, b);
                    }
                }
            }
        }

        /// Property: a child role is granted everything its parents are, with a superset of attributes.
        #[test]
        fn child_dominates_parent((adjacency, grants) in graph_strategy()) {
            let ac = build(&adjacency, &grants, false);

            for i in 0..ROLES {
                for j in (0..i).filter(|&j| adjacency[i][j]) {
                    for resource in &RESOURCES {
                        for action in Action::all() {
                            let parent = ac.resolve(Some(&role(j)), resource, action);
                            let child = ac.resolve(Some(&role(i)), resource, action);
                            if parent.granted {
                                prop_assert!(child.granted);
                                prop_assert!(child.attributes.is_superset(&parent.attributes));
                            }
                        }
                    }
                }
            }
        }
    }
}
