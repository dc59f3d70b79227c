//! Bijection between grids and arbitrary-precision codes.
//!
//! A code is built little-endian by mixed-radix packing: the base and the
//! number of regions first (radix 256 each), then for every cell its value
//! (radix maximum+1) and its region (radix regions+1). For both cell
//! characteristics the digit 0 represents "unassigned", which makes the
//! encoding total over partial grids; region identifiers are therefore
//! shifted by one.

use super::base::Base;
use super::error::{Error, Result};
use super::grid::Grid;
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

/// Radix of the four header digits.
const DIMENSION_RADIX: u32 = 256;

fn push_digit(code: &mut BigUint, radix: u32, digit: u32) {
    *code *= radix;
    *code += digit;
}

fn take_digit(code: &mut BigUint, radix: u32) -> u32 {
    let digit = &*code % radix;
    *code /= radix;
    digit.to_u32().unwrap()
}

/// Returns the code associated with `grid`.
///
/// # Errors
///
/// The grid must carry the canonical region labelling (see
/// [`Grid::normalize`]) and less than 256 regions; anything else returns
/// [`Error::InvariantViolation`].
pub fn encode(grid: &Grid) -> Result<BigUint> {
    let nb_regions = grid.nb_regions();
    if nb_regions >= DIMENSION_RADIX as usize {
        return Err(Error::InvariantViolation(format!(
            "{nb_regions} regions cannot be encoded"
        )));
    }
    let nb_regions = u32::try_from(nb_regions).unwrap();

    let value_radix = u32::from(grid.base.maximum) + 1;
    let region_radix = nb_regions + 1;

    let mut code = BigUint::zero();

    // the cells themselves, in reverse order so that decoding walks the
    // grid in natural order
    for cell in grid.cells.iter().rev() {
        let region = cell.region;
        if region >= 0 && u32::try_from(region).unwrap() >= nb_regions {
            return Err(Error::InvariantViolation(format!(
                "region {region} breaks the canonical labelling"
            )));
        }

        push_digit(
            &mut code,
            region_radix,
            u32::try_from(region + 1).unwrap_or(0),
        );
        push_digit(&mut code, value_radix, u32::from(cell.value));
    }

    // the header digits
    push_digit(&mut code, DIMENSION_RADIX, nb_regions);
    push_digit(&mut code, DIMENSION_RADIX, u32::from(grid.base.maximum));
    push_digit(&mut code, DIMENSION_RADIX, u32::from(grid.base.width));
    push_digit(&mut code, DIMENSION_RADIX, u32::from(grid.base.height));

    Ok(code)
}

/// Returns the grid associated with `code`.
///
/// # Errors
///
/// Returns [`Error::MalformedCode`] when the header does not describe a
/// valid base or when digits remain once every cell has been decoded.
pub fn decode(code: &BigUint) -> Result<Grid> {
    let mut code = code.clone();

    let height = take_digit(&mut code, DIMENSION_RADIX);
    let width = take_digit(&mut code, DIMENSION_RADIX);
    let maximum = take_digit(&mut code, DIMENSION_RADIX);
    let nb_regions = take_digit(&mut code, DIMENSION_RADIX);

    let base = Base::new(
        u8::try_from(height).unwrap(),
        u8::try_from(width).unwrap(),
        u8::try_from(maximum).unwrap(),
    )
    .map_err(|_| {
        Error::MalformedCode(format!(
            "base ({height}, {width}, {maximum}) out of domain"
        ))
    })?;

    let value_radix = maximum + 1;
    let region_radix = nb_regions + 1;

    let mut grid = Grid::new(base);
    for cell in &mut grid.cells {
        let value = take_digit(&mut code, value_radix);
        if value > 0 {
            cell.value = u8::try_from(value).unwrap();
        }

        let region = take_digit(&mut code, region_radix);
        if region > 0 {
            cell.region = i32::try_from(region - 1).unwrap();
        }

        // every remaining cell is unassigned
        if code.is_zero() {
            break;
        }
    }

    if code.is_zero() {
        Ok(grid)
    } else {
        Err(Error::MalformedCode(format!(
            "residue {code} after the last cell"
        )))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn grid(height: u8, width: u8, maximum: u8, cells: &[(u8, i32)]) -> Grid {
        let mut grid = Grid::new(Base::new(height, width, maximum).unwrap());
        for (cell, &(value, region)) in grid.cells.iter_mut().zip(cells) {
            cell.value = value;
            cell.region = region;
        }
        grid
    }

    #[test]
    fn empty_grid_encodes_header_only() {
        let empty = Grid::new(Base::new(1, 1, 3).unwrap());
        let code = encode(&empty).unwrap();

        // ((0·256 + 3)·256 + 1)·256 + 1
        assert_eq!(code, BigUint::from(196865_u32));
        assert_eq!(decode(&code).unwrap(), empty);
    }

    #[test]
    fn roundtrip_full_grid() {
        let grid = grid(2, 2, 4, &[(1, 0), (2, 0), (4, 0), (3, 0)]);
        let code = encode(&grid).unwrap();

        assert_eq!(decode(&code).unwrap(), grid);
    }

    #[test]
    fn roundtrip_partial_grid() {
        let grid = grid(2, 2, 3, &[(1, 0), (3, 1), (0, -1), (0, -1)]);
        let code = encode(&grid).unwrap();

        assert_eq!(decode(&code).unwrap(), grid);
    }

    #[test]
    fn roundtrip_partial_grids_of_every_stage() {
        let full = grid(2, 3, 4, &[(1, 0), (2, 1), (4, 1), (3, 0), (4, 0), (1, 2)]);

        for stage in 0..=full.cells.len() {
            let mut partial = full.clone();
            for cell in &mut partial.cells[stage..] {
                *cell = Default::default();
            }
            partial.normalize();

            let code = encode(&partial).unwrap();
            assert_eq!(decode(&code).unwrap(), partial);
        }
    }

    #[test]
    fn zero_code_is_rejected() {
        assert!(matches!(
            decode(&BigUint::zero()),
            Err(Error::MalformedCode(_))
        ));
    }

    #[test]
    fn trailing_residue_is_rejected() {
        let grid = grid(1, 1, 3, &[(1, 0)]);
        let code = encode(&grid).unwrap();

        // one full set of cell digits too many
        let mut too_long = code.clone();
        too_long += &code * 4_u32 * 2_u32 * 256_u32 * 256_u32 * 256_u32 * 256_u32;

        assert!(decode(&code).is_ok());
        assert!(matches!(
            decode(&too_long),
            Err(Error::MalformedCode(_))
        ));
    }

    #[test]
    fn non_canonical_labelling_is_rejected() {
        // single region labelled 1 instead of 0
        let grid = grid(1, 2, 3, &[(1, 1), (2, 1)]);

        assert!(matches!(
            encode(&grid),
            Err(Error::InvariantViolation(_))
        ));
    }
}
