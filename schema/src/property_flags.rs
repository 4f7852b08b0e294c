//! Named bits of the raw property flags carried on every exported property
//!
//! Flags are exported verbatim; these names cover the bits consumers of the document test. The
//! values match the host engine's property flag layout.

/// Property is user-settable in the editor
pub const EDIT: u64 = 0x0000_0000_0000_0001;
/// Constant function parameter
pub const CONST_PARM: u64 = 0x0000_0000_0000_0002;
/// Property can be read by blueprint code
pub const BLUEPRINT_VISIBLE: u64 = 0x0000_0000_0000_0004;
/// Property cannot be modified by blueprint code
pub const BLUEPRINT_READ_ONLY: u64 = 0x0000_0000_0000_0010;
/// Property is a function parameter
pub const PARM: u64 = 0x0000_0000_0000_0080;
/// Parameter is copied out after the call
pub const OUT_PARM: u64 = 0x0000_0000_0000_0100;
/// Zeroed memory is a valid value
pub const ZERO_CONSTRUCTOR: u64 = 0x0000_0000_0000_0200;
/// Parameter holds the return value
pub const RETURN_PARM: u64 = 0x0000_0000_0000_0400;
/// Parameter must be linked explicitly in blueprint
pub const REQUIRED_PARM: u64 = 0x0000_0000_0000_8000;
/// Parameter is passed by reference; `PARM` and `OUT_PARM` are set too
pub const REFERENCE_PARM: u64 = 0x0000_0000_0800_0000;
/// Value can be copied with a plain memory copy
pub const IS_PLAIN_OLD_DATA: u64 = 0x0000_0000_4000_0000;

/// Bits marking a parameter the callee writes back
pub const OUTPUT_MASK: u64 = OUT_PARM | RETURN_PARM;

/// Whether a parameter with `flags` is written back by the callee
///
/// Either bit of [`OUTPUT_MASK`] suffices: return values carry `RETURN_PARM`, by-reference
/// outputs carry `OUT_PARM`.
pub const fn is_output(flags: u64) -> bool { flags & OUTPUT_MASK != 0 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_classification() {
        assert!(is_output(PARM | OUT_PARM));
        assert!(is_output(PARM | OUT_PARM | RETURN_PARM));
        assert!(is_output(RETURN_PARM));
        assert!(!is_output(PARM));
        assert!(!is_output(PARM | CONST_PARM | REQUIRED_PARM));
        assert!(!is_output(0));
    }
}
