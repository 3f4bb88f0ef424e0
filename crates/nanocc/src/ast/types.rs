//! C type representation
//!
//! Types are plain values: cloning a `Type` clones the whole tree. Struct
//! layout (member offsets, size, alignment) is computed once, when the struct
//! specifier is parsed, so consumers never recompute it.

/// A C type together with its size and alignment in bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    pub kind: TypeKind,
    pub size: usize,
    pub align: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Void,
    Bool,
    Char,
    Int,
    Ptr(Box<Type>),
    Array {
        base: Box<Type>,
        /// `None` for an incomplete array (`int x[]`)
        len: Option<usize>,
    },
    Struct {
        members: Vec<Member>,
        /// Tag declared but body not yet seen
        incomplete: bool,
    },
    Func(Box<Type>),
}

/// A named struct member at a fixed offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub ty: Type,
    pub offset: usize,
}

/// Round `n` up to the next multiple of `align`
pub fn roundup(n: usize, align: usize) -> usize {
    (n + align - 1) / align * align
}

pub fn void_ty() -> Type {
    Type {
        kind: TypeKind::Void,
        size: 0,
        align: 1,
    }
}

pub fn bool_ty() -> Type {
    Type {
        kind: TypeKind::Bool,
        size: 1,
        align: 1,
    }
}

pub fn char_ty() -> Type {
    Type {
        kind: TypeKind::Char,
        size: 1,
        align: 1,
    }
}

pub fn int_ty() -> Type {
    Type {
        kind: TypeKind::Int,
        size: 4,
        align: 4,
    }
}

pub fn ptr_to(base: Type) -> Type {
    Type {
        kind: TypeKind::Ptr(Box::new(base)),
        size: 8,
        align: 8,
    }
}

pub fn ary_of(base: Type, len: Option<usize>) -> Type {
    let size = len.map_or(0, |n| base.size * n);
    let align = base.align;
    Type {
        kind: TypeKind::Array {
            base: Box::new(base),
            len,
        },
        size,
        align,
    }
}

// Pointer-sized, so a function designator can sit where a value is expected.
pub fn func_ty(returning: Type) -> Type {
    Type {
        kind: TypeKind::Func(Box::new(returning)),
        size: 8,
        align: 8,
    }
}

/// Build a struct type from its members, assigning offsets as it goes.
///
/// Each member is placed at the next offset rounded up to the member's
/// alignment; the struct's alignment is the largest member alignment, and its
/// size is the running offset rounded up to that.
pub fn struct_of(members: Vec<(String, Type)>) -> Type {
    let mut laid_out = Vec::with_capacity(members.len());
    let mut offset = 0;
    let mut align = 1;
    for (name, ty) in members {
        offset = roundup(offset, ty.align);
        align = align.max(ty.align);
        let next = offset + ty.size;
        laid_out.push(Member { name, ty, offset });
        offset = next;
    }
    Type {
        kind: TypeKind::Struct {
            members: laid_out,
            incomplete: false,
        },
        size: roundup(offset, align),
        align,
    }
}

/// Placeholder for a struct tag whose body has not been parsed yet
pub fn incomplete_struct() -> Type {
    Type {
        kind: TypeKind::Struct {
            members: Vec::new(),
            incomplete: true,
        },
        size: 0,
        align: 1,
    }
}

impl Type {
    /// Pointed-to or element type, if this is a pointer or array
    pub fn base(&self) -> Option<&Type> {
        match &self.kind {
            TypeKind::Ptr(base) | TypeKind::Array { base, .. } => Some(base),
            _ => None,
        }
    }

    pub fn is_incomplete(&self) -> bool {
        match &self.kind {
            TypeKind::Struct { incomplete, .. } => *incomplete,
            TypeKind::Array { len, .. } => len.is_none(),
            _ => false,
        }
    }

    /// Array-to-pointer decay for parameters and value contexts
    pub fn decay(self) -> Type {
        match self.kind {
            TypeKind::Array { base, .. } => ptr_to(*base),
            _ => self,
        }
    }

    /// Look up a struct member by name
    pub fn member(&self, name: &str) -> Option<&Member> {
        match &self.kind {
            TypeKind::Struct { members, .. } => members.iter().find(|m| m.name == name),
            _ => None,
        }
    }

    /// Return type, if this is a function type
    pub fn returning(&self) -> Option<&Type> {
        match &self.kind {
            TypeKind::Func(ret) => Some(ret),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundup() {
        assert_eq!(roundup(0, 4), 0);
        assert_eq!(roundup(1, 4), 4);
        assert_eq!(roundup(4, 4), 4);
        assert_eq!(roundup(5, 8), 8);
    }

    #[test]
    fn test_array_size() {
        let a = ary_of(int_ty(), Some(3));
        assert_eq!(a.size, 12);
        assert_eq!(a.align, 4);

        let incomplete = ary_of(char_ty(), None);
        assert_eq!(incomplete.size, 0);
        assert!(incomplete.is_incomplete());
    }

    #[test]
    fn test_struct_layout() {
        // struct { char a; int b; char c; }
        let s = struct_of(vec![
            ("a".into(), char_ty()),
            ("b".into(), int_ty()),
            ("c".into(), char_ty()),
        ]);
        assert_eq!(s.member("a").unwrap().offset, 0);
        assert_eq!(s.member("b").unwrap().offset, 4);
        assert_eq!(s.member("c").unwrap().offset, 8);
        assert_eq!(s.align, 4);
        assert_eq!(s.size, 12);
    }

    #[test]
    fn test_struct_of_pointers() {
        // struct { char *p; char q; }
        let s = struct_of(vec![
            ("p".into(), ptr_to(char_ty())),
            ("q".into(), char_ty()),
        ]);
        assert_eq!(s.member("q").unwrap().offset, 8);
        assert_eq!(s.size, 16);
        assert_eq!(s.align, 8);
    }

    #[test]
    fn test_decay() {
        let a = ary_of(int_ty(), Some(4));
        assert_eq!(a.decay(), ptr_to(int_ty()));
        assert_eq!(int_ty().decay(), int_ty());
    }
}
