//! Apply a consensus's bandwidth-weight table to a relay at a given
//! position in a circuit.

use crate::consensus::BandwidthWeights;
use crate::error::Error;
use crate::relay::RelayFlags;

/// Which hop of a circuit a relay is being weighted for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Position {
    /// The first hop.
    Guard,
    /// The second hop.
    Middle,
    /// The final hop.
    Exit,
}

/// Return the raw bandwidth-weight coefficient for a relay with `flags` at
/// `pos`, per the table in the design.
///
/// `Wge` (a relay with both Guard and Exit flags, weighted for the guard
/// position) is not representable and requesting it is a programming error:
/// the bandwidth-weights table simply has no such key, because a guard slot
/// is never filled by reasoning about the relay's Exit flag that way.
pub fn position_weight(flags: RelayFlags, pos: Position, weights: &BandwidthWeights) -> Result<u64, Error> {
    let guard = flags.contains(RelayFlags::GUARD);
    let exit = flags.contains(RelayFlags::EXIT);
    Ok(match (pos, guard, exit) {
        (Position::Guard, true, true) => weights.wgd,
        (Position::Guard, true, false) => weights.wgg,
        (Position::Guard, false, true) => return Err(Error::UnrepresentableWeight),
        (Position::Guard, false, false) => weights.wgm,

        (Position::Middle, true, true) => weights.wmd,
        (Position::Middle, true, false) => weights.wmg,
        (Position::Middle, false, true) => weights.wme,
        (Position::Middle, false, false) => weights.wmm,

        (Position::Exit, true, true) => weights.wed,
        (Position::Exit, true, false) => weights.weg,
        (Position::Exit, false, true) => weights.wee,
        (Position::Exit, false, false) => weights.wem,
    })
}

/// Return the selection weight for one relay at `pos`: its bandwidth scaled
/// by the position weight and the consensus's `bwweightscale`.
pub fn selection_weight(
    bandwidth: u64,
    flags: RelayFlags,
    pos: Position,
    weights: &BandwidthWeights,
    bwweightscale: u64,
) -> Result<f64, Error> {
    let w = position_weight(flags, pos, weights)?;
    Ok((bandwidth as f64) * (w as f64) / (bwweightscale as f64))
}

#[cfg(test)]
mod test {
    use super::*;

    fn weights() -> BandwidthWeights {
        BandwidthWeights {
            wgd: 1,
            wgg: 2,
            wgm: 3,
            wmg: 4,
            wmm: 5,
            wme: 6,
            wmd: 7,
            wee: 8,
            wed: 9,
            weg: 10,
            wem: 11,
        }
    }

    #[test]
    fn wge_is_an_error() {
        let flags = RelayFlags::EXIT;
        assert!(position_weight(flags, Position::Guard, &weights()).is_err());
    }

    #[test]
    fn guard_and_exit_picks_the_d_column() {
        let flags = RelayFlags::GUARD | RelayFlags::EXIT;
        assert_eq!(position_weight(flags, Position::Guard, &weights()).unwrap(), 1);
        assert_eq!(position_weight(flags, Position::Middle, &weights()).unwrap(), 7);
        assert_eq!(position_weight(flags, Position::Exit, &weights()).unwrap(), 9);
    }

    #[test]
    fn neither_flag_picks_the_plain_column() {
        let flags = RelayFlags::empty();
        assert_eq!(position_weight(flags, Position::Guard, &weights()).unwrap(), 3);
        assert_eq!(position_weight(flags, Position::Middle, &weights()).unwrap(), 5);
        assert_eq!(position_weight(flags, Position::Exit, &weights()).unwrap(), 11);
    }
}
