//! Multicall3 bindings.
//!
//! Multicall3 is deployed at the same address on most EVM chains:
//! <https://github.com/mds1/multicall3#deployments>

use alloy_sol_types::sol;

sol! {
    /// Multicall3 - batches read calls into a single `eth_call`
    #[sol(rpc)]
    interface IMulticall3 {
        /// A single call. With `allowFailure` set, a revert only fails this slot.
        #[derive(Debug)]
        struct Call3 {
            address target;
            bool allowFailure;
            bytes callData;
        }

        /// Per-call outcome, in call order.
        #[derive(Debug)]
        struct Call3Result {
            bool success;
            bytes returnData;
        }

        /// Aggregate calls, allowing per-call failure
        function aggregate3(Call3[] calldata calls)
            external payable returns (Call3Result[] memory returnData);
    }
}
