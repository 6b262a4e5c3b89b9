//! Grouped view of the field list

use crate::model::Field;

/// Fields split by group, in the order the data panel shows them.
#[derive(Debug, Default, PartialEq)]
pub struct GroupedFields<'a> {
    /// Named groups ordered by first appearance; members keep input order
    pub groups: Vec<FieldGroup<'a>>,
    /// Fields without a group, in input order
    pub ungrouped: Vec<&'a Field>,
}

#[derive(Debug, PartialEq)]
pub struct FieldGroup<'a> {
    pub name: &'a str,
    pub fields: Vec<&'a Field>,
}

impl<'a> GroupedFields<'a> {
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.fields.len()).sum::<usize>() + self.ungrouped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fields in display order: every group in turn, then the ungrouped ones.
    pub fn iter(&self) -> impl Iterator<Item = &'a Field> + '_ {
        self.groups
            .iter()
            .flat_map(|g| g.fields.iter().copied())
            .chain(self.ungrouped.iter().copied())
    }
}

pub fn group_fields(fields: &[Field]) -> GroupedFields<'_> {
    let mut grouped = GroupedFields::default();

    for field in fields {
        let Some(name) = field.group_name() else {
            grouped.ungrouped.push(field);
            continue;
        };
        match grouped.groups.iter_mut().find(|g| g.name == name) {
            Some(group) => group.fields.push(field),
            None => grouped.groups.push(FieldGroup {
                name,
                fields: vec![field],
            }),
        }
    }

    grouped
}
