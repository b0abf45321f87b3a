//! Address literal macros.
//!
//! Both macros validate their components at compile time and expand to a
//! `const` raw value, so they cost nothing at runtime.

/// Creates a [`GroupAddress`](crate::addressing::GroupAddress) from 3-level notation.
///
/// ```text
/// ga!(main/middle/sub)
/// ```
///
/// - `main`: 0-31
/// - `middle`: 0-7
/// - `sub`: 0-255
///
/// # Examples
///
/// ```rust
/// use knx_secure::{ga, GroupAddress};
///
/// let addr = ga!(1/2/3);
/// assert_eq!(addr, GroupAddress::new(1, 2, 3)?);
/// # Ok::<(), knx_secure::KnxError>(())
/// ```
///
/// Out-of-range components fail to compile:
///
/// ```compile_fail
/// let addr = knx_secure::ga!(32/0/0);
/// ```
///
/// ```compile_fail
/// let addr = knx_secure::ga!(1/8/0);
/// ```
#[macro_export]
macro_rules! ga {
    ($main:literal / $middle:literal / $sub:literal) => {{
        const _: () = {
            if $main > 31 {
                panic!("Main group must be 0-31");
            }
            if $middle > 7 {
                panic!("Middle group must be 0-7");
            }
            if $sub > 255 {
                panic!("Sub group must be 0-255");
            }
        };

        const RAW: u16 = (($main & 0x1F) << 11) | (($middle & 0x07) << 8) | ($sub & 0xFF);
        $crate::addressing::GroupAddress::from(RAW)
    }};
}

/// Creates an [`IndividualAddress`](crate::addressing::IndividualAddress)
/// from its area, line and device components.
///
/// ```text
/// ia!(area, line, device)
/// ```
///
/// # Examples
///
/// ```rust
/// use knx_secure::{ia, IndividualAddress};
///
/// let addr: IndividualAddress = ia!(1, 1, 10);
/// assert_eq!(addr.to_string(), "1.1.10");
/// ```
///
/// ```compile_fail
/// let addr = knx_secure::ia!(16, 0, 0);
/// ```
#[macro_export]
macro_rules! ia {
    ($area:literal, $line:literal, $device:literal) => {{
        const _: () = {
            if $area > 15 {
                panic!("Area must be 0-15");
            }
            if $line > 15 {
                panic!("Line must be 0-15");
            }
            if $device > 255 {
                panic!("Device must be 0-255");
            }
        };

        const RAW: u16 = (($area & 0x0F) << 12) | (($line & 0x0F) << 8) | ($device & 0xFF);
        $crate::addressing::IndividualAddress::from(RAW)
    }};
}

#[cfg(test)]
mod tests {
    use crate::addressing::{GroupAddress, IndividualAddress};

    #[test]
    fn test_ga_macro() {
        assert_eq!(ga!(1 / 2 / 3), GroupAddress::from(0x0A03));
        assert_eq!(ga!(0 / 0 / 0), GroupAddress::BROADCAST);
        assert_eq!(ga!(31 / 7 / 255), GroupAddress::from(0xFFFF));
    }

    #[test]
    fn test_ia_macro() {
        assert_eq!(ia!(1, 1, 1), IndividualAddress::from(0x1101));
        assert_eq!(ia!(15, 15, 255), IndividualAddress::from(0xFFFF));
        assert_eq!(ia!(1, 1, 10), IndividualAddress::new(1, 1, 10).unwrap());
    }
}
